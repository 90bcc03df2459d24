use std::fmt;

use rand::Rng;

use super::generator::{generate_with, EngineConfig};
use super::history::HistoryEntry;
use super::{Choice, Difficulty, Label, OperationSelector, Question};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizSettings {
    pub operation: OperationSelector,
    pub difficulty: Difficulty,
    pub question_count: usize,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            operation: OperationSelector::Mixed,
            difficulty: Difficulty::Easy,
            question_count: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Outcome {
    Correct,
    Wrong,
    Blank,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Correct => "correct",
            Outcome::Wrong => "wrong",
            Outcome::Blank => "blank",
        }
    }
}

/// One answered (or skipped) question, as it goes into the exported record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnswerRecord {
    pub index: usize,
    pub question_text: String,
    pub choices: [Choice; 3],
    pub correct_label: Label,
    pub correct_value: u32,
    pub user_label: Option<Label>,
    pub hint_used: bool,
    pub outcome: Outcome,
}

impl AnswerRecord {
    pub fn user_answer(&self) -> &'static str {
        self.user_label.map(|l| l.as_str()).unwrap_or("blank")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    pub total: u32,
    pub correct: u32,
    pub wrong: u32,
    pub blank: u32,
}

impl Stats {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Wrong => self.wrong += 1,
            Outcome::Blank => self.blank += 1,
        }
        self.total += 1;
    }

    /// `round(correct / total * 100)`, halves rounded up; 0 for an empty session.
    pub fn success_percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.correct * 200 + self.total) / (2 * self.total)
    }

    pub fn verdict(&self) -> &'static str {
        match self.success_percentage() {
            p if p >= 80 => "Excellent!",
            p if p >= 60 => "Good job!",
            p if p >= 40 => "Keep going!",
            _ => "Practice needed!",
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {}  Correct: {}  Wrong: {}  Blank: {}",
            self.total, self.correct, self.wrong, self.blank
        )
    }
}

/// A quiz run: the generated question set, where the user is in it, and what
/// they answered so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    settings: QuizSettings,
    questions: Vec<Question>,
    current: usize,
    answered: bool,
    stats: Stats,
    log: Vec<AnswerRecord>,
}

impl Session {
    pub fn start<R>(settings: QuizSettings, config: &EngineConfig, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let questions = (0..settings.question_count)
            .map(|_| generate_with(config, settings.operation, settings.difficulty, rng))
            .collect();
        Self {
            settings,
            questions,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn log(&self) -> &[AnswerRecord] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// 1-based number of the question on screen.
    pub fn position(&self) -> usize {
        self.current + 1
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.questions.len()
    }

    pub fn is_answered(&self) -> bool {
        self.answered
    }

    /// Questions that would go uncounted if the quiz ended now.
    pub fn remaining(&self) -> usize {
        let open = self.questions.len().saturating_sub(self.current);
        if self.answered {
            open.saturating_sub(1)
        } else {
            open
        }
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// Marks the hint of the current question as used and returns it.
    pub fn reveal_hint(&mut self) -> Option<&str> {
        if self.answered {
            return None;
        }
        let question = self.questions.get_mut(self.current)?;
        question.hint_revealed = true;
        Some(question.hint.as_str())
    }

    /// Records the user's pick for the current question; `None` is a skip.
    ///
    /// Returns `None` when there is nothing left to answer.
    pub fn answer(&mut self, user_label: Option<Label>) -> Option<&AnswerRecord> {
        if self.answered {
            return None;
        }
        let question = self.questions.get(self.current)?;
        let correct = question.correct_choice();

        let outcome = match user_label {
            None => Outcome::Blank,
            Some(label) if label == correct.label => Outcome::Correct,
            Some(_) => Outcome::Wrong,
        };
        let record = AnswerRecord {
            index: self.log.len() + 1,
            question_text: question.text.clone(),
            choices: question.choices.clone(),
            correct_label: correct.label,
            correct_value: correct.value,
            user_label,
            hint_used: question.hint_revealed,
            outcome,
        };

        self.stats.record(outcome);
        self.answered = true;
        self.log.push(record);
        self.log.last()
    }

    /// Moves past an answered question. Returns whether anything is left.
    pub fn advance(&mut self) -> bool {
        if self.answered && !self.is_finished() {
            self.current += 1;
            self.answered = false;
        }
        !self.is_finished()
    }

    /// Ends the quiz early; questions not answered yet are not counted.
    pub fn finish(&mut self) {
        self.current = self.questions.len();
        self.answered = false;
    }

    pub fn summary(&self, date: String) -> HistoryEntry {
        HistoryEntry {
            date,
            operation: self.settings.operation,
            difficulty: self.settings.difficulty,
            total: self.stats.total,
            correct: self.stats.correct,
            wrong: self.stats.wrong,
            blank: self.stats.blank,
        }
    }
}
