use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;

pub mod distractor;
pub mod generator;
pub mod history;
pub mod report;
pub mod session;

/// A concrete arithmetic operation a question is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Addition,
        Operation::Subtraction,
        Operation::Multiplication,
        Operation::Division,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::Addition => "+",
            Operation::Subtraction => "−",
            Operation::Multiplication => "×",
            Operation::Division => "÷",
        }
    }

    pub fn hint(&self, a: u32, b: u32) -> String {
        match self {
            Operation::Addition => format!("Add {b} to {a}. Start with the ones digits."),
            Operation::Subtraction => {
                format!("Take {b} away from {a}. The result will not be negative.")
            }
            Operation::Multiplication => {
                format!("Add {a} to itself {b} times, or recall the times table.")
            }
            Operation::Division => format!("Think: {b} × ? = {a}. Look it up in the times table."),
        }
    }
}

/// What the user asked for: one concrete operation, or a random one per question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OperationSelector {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Mixed,
}

impl OperationSelector {
    pub const ALL: [OperationSelector; 5] = [
        OperationSelector::Mixed,
        OperationSelector::Addition,
        OperationSelector::Subtraction,
        OperationSelector::Multiplication,
        OperationSelector::Division,
    ];

    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Operation {
        match self {
            OperationSelector::Addition => Operation::Addition,
            OperationSelector::Subtraction => Operation::Subtraction,
            OperationSelector::Multiplication => Operation::Multiplication,
            OperationSelector::Division => Operation::Division,
            OperationSelector::Mixed => *Operation::ALL
                .choose(rng)
                .expect("operation list is not empty"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperationSelector::Addition => "Addition",
            OperationSelector::Subtraction => "Subtraction",
            OperationSelector::Multiplication => "Multiplication",
            OperationSelector::Division => "Division",
            OperationSelector::Mixed => "Mixed",
        }
    }
}

impl From<Operation> for OperationSelector {
    fn from(operation: Operation) -> Self {
        match operation {
            Operation::Addition => OperationSelector::Addition,
            Operation::Subtraction => OperationSelector::Subtraction,
            Operation::Multiplication => OperationSelector::Multiplication,
            Operation::Division => OperationSelector::Division,
        }
    }
}

impl fmt::Display for OperationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationSelector {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Label {
    A,
    B,
    C,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::A, Label::B, Label::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::A => "A",
            Label::B => "B",
            Label::C => "C",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Choice {
    pub label: Label,
    pub value: u32,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub text: String,
    pub operation: Operation,
    pub operands: (u32, u32),
    pub correct_answer: u32,
    pub hint: String,
    pub choices: [Choice; 3],
    pub hint_revealed: bool,
}

impl Question {
    pub fn new(operation: Operation, a: u32, b: u32, correct_answer: u32, choices: [Choice; 3]) -> Self {
        Self {
            text: format!("{} {} {} = ?", a, operation.symbol(), b),
            operation,
            operands: (a, b),
            correct_answer,
            hint: operation.hint(a, b),
            choices,
            hint_revealed: false,
        }
    }

    /// The one choice marked correct. A question without one is a broken
    /// question, not something to recover from.
    pub fn correct_choice(&self) -> &Choice {
        debug_assert_eq!(self.choices.iter().filter(|c| c.is_correct).count(), 1);
        self.choices
            .iter()
            .find(|c| c.is_correct)
            .expect("question has no correct choice")
    }

    pub fn choice(&self, label: Label) -> Option<&Choice> {
        self.choices.iter().find(|c| c.label == label)
    }
}
