//! Arithmetic quiz: question and distractor generation, session bookkeeping,
//! plain-text export and a small recent-history store. The Telegram bot in
//! `main.rs` is only a shell around these modules.

pub mod config;
pub mod quiz;
