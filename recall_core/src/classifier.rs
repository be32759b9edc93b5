//! Mastery classification.
//!
//! Categories are derived from a card's persisted schedule and the current
//! time on every call; nothing here is cached on the card.

use crate::types::{CardCategory, CardCounts, Flashcard};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Thresholds a card must meet on all three axes to count as mastered
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MasteryThresholds {
    #[serde(default = "default_min_repetitions")]
    pub min_repetitions: u32,

    #[serde(default = "default_min_ease_factor")]
    pub min_ease_factor: f64,

    #[serde(default = "default_min_interval_days")]
    pub min_interval_days: u32,
}

fn default_min_repetitions() -> u32 {
    3
}

fn default_min_ease_factor() -> f64 {
    2.0
}

fn default_min_interval_days() -> u32 {
    21
}

impl Default for MasteryThresholds {
    fn default() -> Self {
        Self {
            min_repetitions: default_min_repetitions(),
            min_ease_factor: default_min_ease_factor(),
            min_interval_days: default_min_interval_days(),
        }
    }
}

/// Classify a card with the default thresholds
pub fn classify(card: &Flashcard, now: DateTime<Utc>) -> CardCategory {
    classify_with(card, now, &MasteryThresholds::default())
}

/// Classify a card; the first matching rule wins
///
/// 1. never reviewed → `Unseen`
/// 2. meets every mastery threshold → `Mastered`
/// 3. overdue, or repetitions reset to zero → `ToReview`
/// 4. otherwise → `Learning`
pub fn classify_with(
    card: &Flashcard,
    now: DateTime<Utc>,
    thresholds: &MasteryThresholds,
) -> CardCategory {
    if card.last_reviewed_at().is_none() {
        return CardCategory::Unseen;
    }

    if card.repetitions() >= thresholds.min_repetitions
        && card.ease_factor() >= thresholds.min_ease_factor
        && card.interval_days() >= thresholds.min_interval_days
    {
        return CardCategory::Mastered;
    }

    let overdue = card.next_review_at().is_some_and(|at| at <= now);
    if overdue || card.repetitions() == 0 {
        return CardCategory::ToReview;
    }

    CardCategory::Learning
}

/// Tally categories in a single pass
pub fn classify_many<'a, I>(cards: I, now: DateTime<Utc>) -> CardCounts
where
    I: IntoIterator<Item = &'a Flashcard>,
{
    classify_many_with(cards, now, &MasteryThresholds::default())
}

pub fn classify_many_with<'a, I>(
    cards: I,
    now: DateTime<Utc>,
    thresholds: &MasteryThresholds,
) -> CardCounts
where
    I: IntoIterator<Item = &'a Flashcard>,
{
    let mut counts = CardCounts::default();
    for card in cards {
        counts.record(classify_with(card, now, thresholds));
    }
    counts
}

/// Progress percentage: mastered cards count fully, learning cards half
pub fn progress(counts: &CardCounts) -> u8 {
    if counts.total == 0 {
        return 0;
    }

    let score = counts.mastered as f64 + 0.5 * counts.learning as f64;
    let pct = (100.0 * score / counts.total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}
