#![forbid(unsafe_code)]

//! Spaced-repetition scheduling and practice generation.
//!
//! This crate provides:
//! - Domain types (flashcards, decks, quality verdicts, quiz questions)
//! - SM-2 scheduling and the review write path
//! - Mastery classification and statistics
//! - Quiz, challenge and hint generation
//! - Persistence (record store, review log) and configuration

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod clock;
pub mod text;
pub mod sm2;
pub mod classifier;
pub mod hints;
pub mod store;
pub mod review_log;
pub mod review;
pub mod quiz;
pub mod challenge;
pub mod stats;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use clock::{Clock, FixedClock, SystemClock};
pub use classifier::{classify, classify_many, progress, MasteryThresholds};
pub use hints::{apply_penalty, next_hint, HintProgress};
pub use store::{CardEditor, CardQuery, CardStore, JsonStore, MemoryStore};
pub use review_log::{JsonlReviewLog, ReviewSink};
pub use review::ReviewCoordinator;
pub use stats::{sort_decks, DeckSortKey, StatisticsAggregator};
