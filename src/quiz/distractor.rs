use rand::seq::SliceRandom;
use rand::Rng;

use super::{Choice, Label, Operation};

/// Knobs of the wrong-answer strategies.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DistractorConfig {
    /// Shift that keeps the ones digit, simulating a tens-place slip.
    pub tens_shift: i64,
    /// Off-by-a-little slips, applied in both directions.
    pub small_deviations: Vec<i64>,
    /// Largest offset tried when the strategies run dry.
    pub fallback_max_offset: i64,
    pub fallback_attempts: u32,
}

impl Default for DistractorConfig {
    fn default() -> Self {
        Self {
            tens_shift: 10,
            small_deviations: vec![1, 2, 5],
            fallback_max_offset: 15,
            fallback_attempts: 100,
        }
    }
}

/// Every value the mistake strategies produce, before any filtering.
///
/// Values can be negative, zero, or repeat each other. A shift that would
/// overflow produces nothing.
pub fn raw_candidates(config: &DistractorConfig, correct: u32, operation: Operation, a: u32, b: u32) -> Vec<i64> {
    let (c, a, b) = (correct as i64, a as i64, b as i64);
    let mut raw: Vec<i64> = [c.checked_add(config.tens_shift), c.checked_sub(config.tens_shift)]
        .into_iter()
        .flatten()
        .collect();

    for &d in &config.small_deviations {
        raw.extend(c.checked_add(d));
        raw.extend(c.checked_sub(d));
    }

    // Same operands, wrong operator.
    match operation {
        Operation::Subtraction => raw.extend([b - a, a + b]),
        Operation::Multiplication => raw.extend([a + b, a * (b - 1)]),
        Operation::Division => raw.extend([a * b, div_round_half_up(a, b + 1)]),
        Operation::Addition => raw.extend([a * b, (a - b).abs()]),
    }

    raw
}

/// The strategy output that can actually be offered: positive, distinct,
/// never the correct answer. Order of first appearance is kept.
pub fn candidate_pool(config: &DistractorConfig, correct: u32, operation: Operation, a: u32, b: u32) -> Vec<u32> {
    let mut pool: Vec<u32> = Vec::new();
    for value in raw_candidates(config, correct, operation, a, b) {
        if let Some(value) = accept(value, correct, &pool) {
            pool.push(value);
        }
    }
    pool
}

/// Two distinct positive wrong answers for `correct`.
pub fn pick_distractors<R>(
    config: &DistractorConfig,
    correct: u32,
    operation: Operation,
    a: u32,
    b: u32,
    rng: &mut R,
) -> [u32; 2]
where
    R: Rng + ?Sized,
{
    let mut pool = candidate_pool(config, correct, operation, a, b);
    pool.shuffle(rng);

    let mut picked: Vec<u32> = Vec::with_capacity(2);
    for value in pool {
        if picked.len() == 2 {
            break;
        }
        if !picked.contains(&value) {
            picked.push(value);
        }
    }

    let mut attempts = 0;
    while picked.len() < 2 && attempts < config.fallback_attempts && config.fallback_max_offset >= 1 {
        attempts += 1;
        let offset = rng.gen_range(1..=config.fallback_max_offset);
        let offset = if rng.gen_bool(0.5) { offset } else { -offset };
        let Some(value) = (correct as i64).checked_add(offset) else {
            continue;
        };
        if let Some(value) = accept(value, correct, &picked) {
            picked.push(value);
        }
    }

    if picked.len() < 2 {
        log::debug!("random fallback exhausted for {correct}, sweeping neighbours");
    }
    // Deterministic sweep; closes the loop even if every random draw collided.
    let mut offset = 1i64;
    while picked.len() < 2 {
        for value in [correct as i64 + offset, correct as i64 - offset] {
            if picked.len() < 2 {
                if let Some(value) = accept(value, correct, &picked) {
                    picked.push(value);
                }
            }
        }
        offset += 1;
    }

    debug_assert!(picked[0] != picked[1] && picked.iter().all(|v| *v != correct && *v > 0));
    [picked[0], picked[1]]
}

/// Correct answer plus two distractors, shuffled and labelled A, B, C by position.
pub fn build_choices<R>(
    config: &DistractorConfig,
    correct: u32,
    operation: Operation,
    a: u32,
    b: u32,
    rng: &mut R,
) -> [Choice; 3]
where
    R: Rng + ?Sized,
{
    let [first, second] = pick_distractors(config, correct, operation, a, b, rng);
    let mut values = [(correct, true), (first, false), (second, false)];
    values.shuffle(rng);

    [0, 1, 2].map(|i| Choice {
        label: Label::ALL[i],
        value: values[i].0,
        is_correct: values[i].1,
    })
}

fn accept(value: i64, correct: u32, taken: &[u32]) -> Option<u32> {
    let value = u32::try_from(value).ok()?;
    if value == 0 || value == correct || taken.contains(&value) {
        return None;
    }
    Some(value)
}

// Rounds halves up; both arguments are non-negative here and `d` is at least 1.
fn div_round_half_up(n: i64, d: i64) -> i64 {
    (2 * n + d) / (2 * d)
}
