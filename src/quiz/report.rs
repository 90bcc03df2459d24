use chrono::NaiveDate;

use super::session::Session;

const RULE: &str = "─────────────────────────────────────────";

pub fn file_name(date: NaiveDate) -> String {
    format!("quiz_records_{}.txt", date.format("%Y-%m-%d"))
}

/// Plain-text record of a session: settings, totals, then every answered question.
pub fn render(session: &Session, generated_at: &str) -> String {
    let settings = session.settings();
    let stats = session.stats();

    let mut lines = vec![
        "╔══════════════════════════════════════════╗".to_string(),
        "║          MATIKQUIZ – SESSION RECORD      ║".to_string(),
        "╚══════════════════════════════════════════╝".to_string(),
        String::new(),
        format!("Date / Time    : {generated_at}"),
        format!("Operation      : {}", settings.operation),
        format!("Difficulty     : {}", settings.difficulty),
        format!("Questions      : {}", settings.question_count),
        String::new(),
        RULE.to_string(),
        format!(
            "  TOTAL: {}   CORRECT: {}   WRONG: {}   BLANK: {}",
            stats.total, stats.correct, stats.wrong, stats.blank
        ),
        format!("  SUCCESS RATE: %{}", stats.success_percentage()),
        RULE.to_string(),
        String::new(),
    ];

    for record in session.log() {
        lines.push(format!("Q{:02}.  {}", record.index, record.question_text));
        for choice in &record.choices {
            let mark = if choice.is_correct { " ✓" } else { "  " };
            lines.push(format!("     [{}]{} {}", choice.label, mark, choice.value));
        }
        lines.push(format!(
            "     Correct answer : [{}] = {}",
            record.correct_label, record.correct_value
        ));
        lines.push(format!("     Your answer    : {}", record.user_answer().to_uppercase()));
        lines.push(format!(
            "     Hint used      : {}",
            if record.hint_used { "YES" } else { "NO" }
        ));
        lines.push(format!("     Outcome        : {}", record.outcome.as_str().to_uppercase()));
        lines.push(String::new());
    }

    lines.push("╔══════════════════════════════════════════╗".to_string());
    lines.push("║          END OF RECORD – MATIKQUIZ       ║".to_string());
    lines.push("╚══════════════════════════════════════════╝".to_string());

    let mut txt = lines.join("\n");
    txt.push('\n');
    txt
}
