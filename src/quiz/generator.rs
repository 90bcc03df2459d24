use rand::Rng;

use super::distractor::{build_choices, DistractorConfig};
use super::{Difficulty, Operation, OperationSelector, Question};

/// Closed operand range, `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Range {
    pub min: u32,
    pub max: u32,
}

impl Range {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min..=self.max)
    }
}

/// Operand limits of one difficulty tier.
///
/// Addition and subtraction use `base`. Multiplication and division draw from
/// `2..=cap` with much smaller caps so products and dividends stay short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TierRanges {
    pub base: Range,
    pub factor_cap: u32,
    pub divisor_cap: u32,
    pub quotient_cap: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RangeTable {
    pub easy: TierRanges,
    pub medium: TierRanges,
    pub hard: TierRanges,
}

impl RangeTable {
    pub fn tier(&self, difficulty: Difficulty) -> &TierRanges {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

impl Default for RangeTable {
    fn default() -> Self {
        Self {
            easy: TierRanges {
                base: Range::new(1, 20),
                factor_cap: 10,
                divisor_cap: 9,
                quotient_cap: 10,
            },
            medium: TierRanges {
                base: Range::new(5, 99),
                factor_cap: 15,
                divisor_cap: 12,
                quotient_cap: 15,
            },
            hard: TierRanges {
                base: Range::new(10, 999),
                factor_cap: 30,
                divisor_cap: 20,
                quotient_cap: 30,
            },
        }
    }
}

/// Everything question generation can be tuned with.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    pub ranges: RangeTable,
    pub distractors: DistractorConfig,
}

/// A fresh question with the default range and distractor tables.
pub fn generate<R>(selector: OperationSelector, difficulty: Difficulty, rng: &mut R) -> Question
where
    R: Rng + ?Sized,
{
    generate_with(&EngineConfig::default(), selector, difficulty, rng)
}

pub fn generate_with<R>(
    config: &EngineConfig,
    selector: OperationSelector,
    difficulty: Difficulty,
    rng: &mut R,
) -> Question
where
    R: Rng + ?Sized,
{
    let operation = selector.resolve(rng);
    let tier = config.ranges.tier(difficulty);

    let (a, b, answer) = match operation {
        Operation::Addition => {
            let (a, b) = (tier.base.draw(rng), tier.base.draw(rng));
            (a, b, a + b)
        }
        Operation::Subtraction => {
            let (a, b) = order_subtraction(tier.base.draw(rng), tier.base.draw(rng), tier.base);
            (a, b, a - b)
        }
        Operation::Multiplication => {
            let factors = Range::new(2, tier.factor_cap);
            let (a, b) = (factors.draw(rng), factors.draw(rng));
            (a, b, a * b)
        }
        Operation::Division => {
            // Built from the answer backwards so the division is always exact.
            let divisor = Range::new(2, tier.divisor_cap).draw(rng);
            let quotient = Range::new(2, tier.quotient_cap).draw(rng);
            (divisor * quotient, divisor, quotient)
        }
    };
    debug_assert!(answer > 0, "{a} {} {b} produced {answer}", operation.symbol());

    let choices = build_choices(&config.distractors, answer, operation, a, b, rng);
    Question::new(operation, a, b, answer, choices)
}

// Larger operand first, and never equal: a zero difference is not a valid answer.
fn order_subtraction(mut a: u32, mut b: u32, range: Range) -> (u32, u32) {
    debug_assert!(range.min < range.max);
    if b > a {
        std::mem::swap(&mut a, &mut b);
    }
    if a == b {
        if a < range.max {
            a += 1;
        } else {
            b -= 1;
        }
    }
    (a, b)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn easy_division_is_exact_and_small() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..500 {
            let question = generate(OperationSelector::Division, Difficulty::Easy, &mut rng);
            let (a, b) = question.operands;
            assert_eq!(question.operation, Operation::Division);
            assert_eq!(question.text, format!("{a} ÷ {b} = ?"));
            assert!((2..=9).contains(&b));
            assert!((2..=10).contains(&question.correct_answer));
            assert_eq!(a, b * question.correct_answer);
            assert_eq!(question.correct_choice().value, question.correct_answer);
        }
    }

    #[test]
    fn subtraction_swaps_operands() {
        let easy = RangeTable::default().easy.base;
        assert_eq!(order_subtraction(4, 17, easy), (17, 4));
        assert_eq!(order_subtraction(17, 4, easy), (17, 4));
    }

    #[test]
    fn equal_subtraction_draws_are_separated() {
        let easy = RangeTable::default().easy.base;
        assert_eq!(order_subtraction(9, 9, easy), (10, 9));
        assert_eq!(order_subtraction(20, 20, easy), (20, 19));
        assert_eq!(order_subtraction(1, 1, easy), (2, 1));
    }

    #[test]
    fn every_question_is_well_formed() {
        let mut rng = StdRng::seed_from_u64(99);
        for selector in OperationSelector::ALL {
            for difficulty in Difficulty::ALL {
                for _ in 0..500 {
                    let q = generate(selector, difficulty, &mut rng);
                    let (a, b) = q.operands;
                    assert!(q.correct_answer > 0, "{}", q.text);
                    assert_eq!(q.choices.iter().filter(|c| c.is_correct).count(), 1);
                    assert_eq!(q.correct_choice().value, q.correct_answer);

                    let values: HashSet<u32> = q.choices.iter().map(|c| c.value).collect();
                    assert_eq!(values.len(), 3, "{:?}", q.choices);
                    assert!(values.iter().all(|v| *v > 0));

                    match q.operation {
                        Operation::Addition => assert_eq!(q.correct_answer, a + b),
                        Operation::Subtraction => {
                            assert!(a >= b);
                            assert_eq!(q.correct_answer, a - b);
                        }
                        Operation::Multiplication => {
                            assert_eq!(q.correct_answer, a * b);
                            assert!(q.correct_answer <= 900);
                        }
                        Operation::Division => {
                            assert_eq!(a % b, 0);
                            assert_eq!(q.correct_answer, a / b);
                            assert!(a <= 600);
                        }
                    }
                    if selector != OperationSelector::Mixed {
                        assert_eq!(OperationSelector::from(q.operation), selector);
                    }
                    assert!(!q.hint.is_empty());
                }
            }
        }
    }

    #[test]
    fn operands_respect_tier_ranges() {
        let table = RangeTable::default();
        let mut rng = StdRng::seed_from_u64(8);
        for difficulty in Difficulty::ALL {
            let tier = table.tier(difficulty);
            for _ in 0..300 {
                let q = generate(OperationSelector::Addition, difficulty, &mut rng);
                let (a, b) = q.operands;
                assert!((tier.base.min..=tier.base.max).contains(&a));
                assert!((tier.base.min..=tier.base.max).contains(&b));

                let q = generate(OperationSelector::Multiplication, difficulty, &mut rng);
                let (a, b) = q.operands;
                assert!((2..=tier.factor_cap).contains(&a));
                assert!((2..=tier.factor_cap).contains(&b));
            }
        }
    }

    #[test]
    fn tiers_grow_with_difficulty() {
        let table = RangeTable::default();
        let (easy, medium, hard) = (table.easy, table.medium, table.hard);
        assert!(easy.base.max < medium.base.max && medium.base.max < hard.base.max);
        assert!(easy.factor_cap < medium.factor_cap && medium.factor_cap < hard.factor_cap);
        assert!(easy.divisor_cap < medium.divisor_cap && medium.divisor_cap < hard.divisor_cap);
    }

    #[test]
    fn mixed_spreads_questions_over_every_operation() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut counts: HashMap<Operation, u32> = HashMap::new();
        for _ in 0..4_000 {
            let operation = generate(OperationSelector::Mixed, Difficulty::Medium, &mut rng).operation;
            *counts.entry(operation).or_default() += 1;
        }
        assert_eq!(counts.len(), 4);
        for operation in Operation::ALL {
            let n = counts.get(&operation).copied().unwrap_or(0);
            assert!((850..=1_150).contains(&n), "{operation:?} came up {n} times");
        }
    }
}
