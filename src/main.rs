use std::sync::Arc;

use chrono::Local;
use dotenv::dotenv;
use log::{debug, info};
use matikquiz_bot::config::Config;
use matikquiz_bot::quiz::{
    history::{render_history, HistoryStore},
    report,
    session::{AnswerRecord, Outcome, QuizSettings, Session, Stats},
    Difficulty, Label, OperationSelector,
};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{InputFile, KeyboardButton, KeyboardMarkup},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveOperation,
    ReceiveDifficulty {
        operation: OperationSelector,
    },
    ReceiveAmountOfQuestions {
        operation: OperationSelector,
        difficulty: Difficulty,
    },
    Quiz {
        session: Session,
    },
    ConfirmExit {
        session: Session,
    },
}

type QuizStorage = std::sync::Arc<ErasedStorage<State>>;

const MAX_QUESTIONS: usize = 50;

const HINT_BUTTON: &str = "Hint";
const SKIP_BUTTON: &str = "Skip";
const NEXT_BUTTON: &str = "Next";
const EXIT_BUTTON: &str = "Exit";
const YES_BUTTON: &str = "Yes";
const NO_BUTTON: &str = "No";

#[tokio::main]
async fn main() -> HandlerResult {
    let env_loaded = dotenv().is_ok();
    pretty_env_logger::init();
    if !env_loaded {
        debug!("No .env file, using the process environment only");
    }
    info!("Starting quiz bot...");

    let config = Arc::new(Config::from_env());
    let bot = Bot::from_env();

    info!("Opening dialogue storage at {}", config.db_path);
    let storage: QuizStorage = SqliteStorage::open(&config.db_path, Json).await?.erase();
    info!("Opening session history at {}", config.history_db_path);
    let history = Arc::new(HistoryStore::open(&config.history_db_path).await?);

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveOperation].endpoint(receive_operation))
            .branch(dptree::case![State::ReceiveDifficulty { operation }].endpoint(receive_difficulty))
            .branch(
                dptree::case![State::ReceiveAmountOfQuestions {
                    operation,
                    difficulty
                }]
                .endpoint(receive_amount_of_questions),
            )
            .branch(dptree::case![State::Quiz { session }].endpoint(quiz))
            .branch(dptree::case![State::ConfirmExit { session }].endpoint(confirm_exit)),
    )
    .dependencies(dptree::deps![storage, config, history])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

fn operation_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(
        OperationSelector::ALL
            .iter()
            .map(|op| vec![KeyboardButton::new(op.name())])
            .collect::<Vec<_>>(),
    )
}

fn answer_keyboard(hint_available: bool) -> KeyboardMarkup {
    let mut helpers = Vec::new();
    if hint_available {
        helpers.push(KeyboardButton::new(HINT_BUTTON));
    }
    helpers.push(KeyboardButton::new(SKIP_BUTTON));

    KeyboardMarkup::new(vec![
        Label::ALL
            .iter()
            .map(|l| KeyboardButton::new(l.as_str()))
            .collect::<Vec<_>>(),
        helpers,
        vec![KeyboardButton::new(EXIT_BUTTON)],
    ])
}

fn feedback_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(NEXT_BUTTON),
        KeyboardButton::new(EXIT_BUTTON),
    ]])
}

async fn history_text(history: &HistoryStore, chat_id: ChatId) -> Option<String> {
    let entries = history.load(chat_id).await;
    if entries.is_empty() {
        return None;
    }
    Some(format!("Your recent sessions:\n\n{}", render_history(&entries)))
}

// Kept out of the async handlers: the thread RNG must not live across an await.
fn new_session(settings: QuizSettings, config: &Config) -> Session {
    Session::start(settings, &config.engine, &mut rand::thread_rng())
}

const GREETING_TEXT: &str = "Hi! I'm MatikQuiz. Let's practise some arithmetic: pick an operation, a difficulty and how many questions you want.";
async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message, history: Arc<HistoryStore>) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT).await?;
    if let Some(text) = history_text(&history, msg.chat.id).await {
        bot.send_message(msg.chat.id, text).await?;
    }
    bot.send_message(msg.chat.id, "Which operation?")
        .reply_markup(operation_keyboard())
        .await?;

    dialogue.update(State::ReceiveOperation).await?;
    Ok(())
}

async fn receive_operation(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    let Some(operation) = msg.text().and_then(|t| t.parse::<OperationSelector>().ok()) else {
        bot.send_message(msg.chat.id, "Please pick one of the operations")
            .reply_markup(operation_keyboard())
            .await?;
        return Ok(());
    };

    let keyboard = KeyboardMarkup::new(vec![Difficulty::ALL
        .iter()
        .map(|d| KeyboardButton::new(d.name()))
        .collect::<Vec<_>>()]);
    bot.send_message(msg.chat.id, "How hard should it be?")
        .reply_markup(keyboard)
        .await?;

    dialogue.update(State::ReceiveDifficulty { operation }).await?;
    Ok(())
}

async fn receive_difficulty(
    bot: Bot,
    dialogue: QuizDialogue,
    operation: OperationSelector,
    msg: Message,
) -> HandlerResult {
    let Some(difficulty) = msg.text().and_then(|t| t.parse::<Difficulty>().ok()) else {
        bot.send_message(msg.chat.id, "Please pick Easy, Medium or Hard")
            .await?;
        return Ok(());
    };

    let keyboard = KeyboardMarkup::new(vec![
        vec![KeyboardButton::new("5"), KeyboardButton::new("10")],
        vec![KeyboardButton::new("15"), KeyboardButton::new("20")],
    ]);
    bot.send_message(msg.chat.id, "How many questions?")
        .reply_markup(keyboard)
        .await?;

    dialogue
        .update(State::ReceiveAmountOfQuestions {
            operation,
            difficulty,
        })
        .await?;
    Ok(())
}

async fn receive_amount_of_questions(
    bot: Bot,
    dialogue: QuizDialogue,
    (operation, difficulty): (OperationSelector, Difficulty),
    msg: Message,
    config: Arc<Config>,
) -> HandlerResult {
    let Some(amount) = msg.text().and_then(|t| t.trim().parse::<usize>().ok()) else {
        bot.send_message(msg.chat.id, "Please enter a number").await?;
        return Ok(());
    };
    if amount == 0 {
        bot.send_message(msg.chat.id, "The number of questions can't be 0")
            .await?;
        return Ok(());
    }
    if amount > MAX_QUESTIONS {
        bot.send_message(msg.chat.id, format!("Please pick at most {MAX_QUESTIONS} questions"))
            .await?;
        return Ok(());
    }

    let settings = QuizSettings {
        operation,
        difficulty,
        question_count: amount,
    };
    let session = new_session(settings, &config);
    info!(
        "Chat {} started a {} / {} quiz with {} questions",
        msg.chat.id.0, operation, difficulty, amount
    );

    bot.send_message(msg.chat.id, "Great! Let's go!").await?;
    send_question(&bot, msg.chat.id, &session).await?;

    dialogue.update(State::Quiz { session }).await?;
    Ok(())
}

async fn send_question(bot: &Bot, chat_id: ChatId, session: &Session) -> HandlerResult {
    let Some(question) = session.current() else {
        return Ok(());
    };
    let settings = session.settings();

    let choices = question
        .choices
        .iter()
        .map(|c| format!("{}) {}", c.label, c.value))
        .collect::<Vec<_>>()
        .join("\n");
    let text = format!(
        "Question {} / {} ({} · {})\n\n{}\n\n{}",
        session.position(),
        session.len(),
        settings.operation,
        settings.difficulty,
        question.text,
        choices
    );

    bot.send_message(chat_id, text)
        .reply_markup(answer_keyboard(!question.hint_revealed))
        .await?;
    Ok(())
}

async fn send_feedback(bot: &Bot, chat_id: ChatId, record: &AnswerRecord, stats: &Stats) -> HandlerResult {
    let verdict = match record.outcome {
        Outcome::Correct => "✓ Correct!",
        Outcome::Wrong => "✗ Wrong!",
        Outcome::Blank => "○ Skipped.",
    };

    bot.send_message(
        chat_id,
        format!(
            "{}\nCorrect answer: [{}] = {}\n\n{}",
            verdict, record.correct_label, record.correct_value, stats
        ),
    )
    .reply_markup(feedback_keyboard())
    .await?;
    Ok(())
}

async fn quiz(
    bot: Bot,
    dialogue: QuizDialogue,
    mut session: Session,
    msg: Message,
    history: Arc<HistoryStore>,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please answer with one of the buttons")
            .await?;
        return Ok(());
    };

    match text {
        EXIT_BUTTON => {
            let keyboard = KeyboardMarkup::new(vec![vec![
                KeyboardButton::new(YES_BUTTON),
                KeyboardButton::new(NO_BUTTON),
            ]]);
            bot.send_message(
                msg.chat.id,
                format!(
                    "End the quiz now? {} unanswered question(s) will not be counted.",
                    session.remaining()
                ),
            )
            .reply_markup(keyboard)
            .await?;
            dialogue.update(State::ConfirmExit { session }).await?;
            return Ok(());
        }
        NEXT_BUTTON if session.is_answered() => {
            if !session.advance() {
                return finish_quiz(&bot, &dialogue, msg.chat.id, &session, &history).await;
            }
            send_question(&bot, msg.chat.id, &session).await?;
        }
        HINT_BUTTON if !session.is_answered() => {
            if let Some(hint) = session.reveal_hint().map(str::to_owned) {
                bot.send_message(msg.chat.id, format!("Hint: {hint}"))
                    .reply_markup(answer_keyboard(false))
                    .await?;
            }
        }
        SKIP_BUTTON if !session.is_answered() => {
            if let Some(record) = session.answer(None).cloned() {
                send_feedback(&bot, msg.chat.id, &record, session.stats()).await?;
            }
        }
        other => match other.parse::<Label>() {
            Ok(label) if !session.is_answered() => {
                if let Some(record) = session.answer(Some(label)).cloned() {
                    send_feedback(&bot, msg.chat.id, &record, session.stats()).await?;
                }
            }
            _ => {
                bot.send_message(msg.chat.id, "Please use one of the buttons")
                    .await?;
                return Ok(());
            }
        },
    }

    dialogue.update(State::Quiz { session }).await?;
    Ok(())
}

async fn finish_quiz(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    session: &Session,
    history: &HistoryStore,
) -> HandlerResult {
    let now = Local::now();
    let stamp = now.format("%d.%m.%Y %H:%M:%S").to_string();
    let stats = session.stats();

    let summary = format!(
        "{}\n\n{}\nSuccess rate: %{}",
        stats.verdict(),
        stats,
        stats.success_percentage()
    );
    bot.send_message(chat_id, summary).await?;
    info!(
        "Chat {} finished a quiz: {}/{} correct",
        chat_id.0, stats.correct, stats.total
    );

    history.record(chat_id, session.summary(stamp.clone())).await;

    let record = report::render(session, &stamp);
    bot.send_document(
        chat_id,
        InputFile::memory(record.into_bytes()).file_name(report::file_name(now.date_naive())),
    )
    .await?;

    if let Some(text) = history_text(history, chat_id).await {
        bot.send_message(chat_id, text).await?;
    }
    bot.send_message(chat_id, "Want another round? Pick an operation.")
        .reply_markup(operation_keyboard())
        .await?;

    dialogue.update(State::ReceiveOperation).await?;
    Ok(())
}

async fn confirm_exit(
    bot: Bot,
    dialogue: QuizDialogue,
    mut session: Session,
    msg: Message,
    history: Arc<HistoryStore>,
) -> HandlerResult {
    match msg.text() {
        Some(YES_BUTTON) => {
            session.finish();
            finish_quiz(&bot, &dialogue, msg.chat.id, &session, &history).await
        }
        Some(NO_BUTTON) => {
            if session.is_answered() {
                bot.send_message(msg.chat.id, format!("Carrying on.\n\n{}", session.stats()))
                    .reply_markup(feedback_keyboard())
                    .await?;
            } else {
                send_question(&bot, msg.chat.id, &session).await?;
            }
            dialogue.update(State::Quiz { session }).await?;
            Ok(())
        }
        _ => {
            bot.send_message(msg.chat.id, "Please answer Yes or No").await?;
            Ok(())
        }
    }
}
