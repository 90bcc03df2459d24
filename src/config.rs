use std::env;

use crate::quiz::generator::EngineConfig;
use crate::quiz::history::HISTORY_KEY;

/// Largest tens shift or fallback offset taken from the environment.
pub const MAX_DISTRACTOR_OFFSET: i64 = 1_000_000;

/// Settings read from the environment (and `.env`, when present).
///
/// The bot token itself is read by teloxide from `TELOXIDE_TOKEN`.
#[derive(Clone, Debug)]
pub struct Config {
    pub db_path: String,
    pub history_db_path: String,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let mut engine = EngineConfig::default();
        if let Some(shift) = parse_var::<i64>("QUIZ_TENS_SHIFT") {
            engine.distractors.tens_shift = shift.clamp(0, MAX_DISTRACTOR_OFFSET);
        }
        if let Some(offset) = parse_var::<i64>("QUIZ_FALLBACK_MAX_OFFSET") {
            engine.distractors.fallback_max_offset = offset.clamp(1, MAX_DISTRACTOR_OFFSET);
        }
        if let Some(attempts) = parse_var("QUIZ_FALLBACK_ATTEMPTS") {
            engine.distractors.fallback_attempts = attempts;
        }

        Self {
            db_path: env::var("QUIZ_DB_PATH").unwrap_or_else(|_| "db.sqlite".to_string()),
            history_db_path: env::var("QUIZ_HISTORY_DB_PATH")
                .unwrap_or_else(|_| format!("{HISTORY_KEY}.sqlite")),
            engine,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {name}={raw:?}: not a number");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::generator::RangeTable;

    // Only variables no other test touches, since tests share the process env.
    #[test]
    fn distractor_knobs_come_from_env() {
        env::set_var("QUIZ_TENS_SHIFT", "20");
        env::set_var("QUIZ_FALLBACK_MAX_OFFSET", "0");
        env::set_var("QUIZ_FALLBACK_ATTEMPTS", "many");

        let config = Config::from_env();
        assert_eq!(config.engine.distractors.tens_shift, 20);
        assert_eq!(config.engine.distractors.fallback_max_offset, 1);
        assert_eq!(config.engine.distractors.fallback_attempts, 100);
        assert_eq!(config.engine.ranges, RangeTable::default());

        env::set_var("QUIZ_TENS_SHIFT", i64::MAX.to_string());
        env::set_var("QUIZ_FALLBACK_MAX_OFFSET", "9223372036854775807");
        let config = Config::from_env();
        assert_eq!(config.engine.distractors.tens_shift, MAX_DISTRACTOR_OFFSET);
        assert_eq!(config.engine.distractors.fallback_max_offset, MAX_DISTRACTOR_OFFSET);

        env::set_var("QUIZ_TENS_SHIFT", "-40");
        assert_eq!(Config::from_env().engine.distractors.tens_shift, 0);

        env::remove_var("QUIZ_TENS_SHIFT");
        env::remove_var("QUIZ_FALLBACK_MAX_OFFSET");
        env::remove_var("QUIZ_FALLBACK_ATTEMPTS");
    }
}
