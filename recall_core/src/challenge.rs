//! Challenge session selection.
//!
//! A challenge is a size-bounded practice set biased toward low-ease and
//! overdue cards. Cards are bucketed by the first rule that matches them:
//!
//! 1. **hard**: ease factor below 2.0
//! 2. **new**: never scheduled
//! 3. **due**: next review at or before now
//! 4. **other**: everything else
//!
//! Buckets then fill the session in priority order up to cumulative caps of
//! 40% (hard), 70% (due), 90% (new) and 100% (other) of the limit.

use crate::{ChallengeConfig, Flashcard};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Ease factor below which a card counts as hard
pub const HARD_EASE_THRESHOLD: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bucket {
    Hard,
    New,
    Due,
    Other,
}

fn bucket_of(card: &Flashcard, now: DateTime<Utc>) -> Bucket {
    if card.ease_factor() < HARD_EASE_THRESHOLD {
        Bucket::Hard
    } else if card.next_review_at().is_none() {
        Bucket::New
    } else if card.is_due(now) {
        Bucket::Due
    } else {
        Bucket::Other
    }
}

/// `ceil(limit × percent / 100)`
fn cap(limit: usize, percent: usize) -> usize {
    (limit * percent).div_ceil(100)
}

/// Sort the pool: ease ascending, next review ascending (never scheduled
/// first), newest first
fn pre_order(pool: &mut [Flashcard]) {
    pool.sort_by(|a, b| {
        a.ease_factor()
            .total_cmp(&b.ease_factor())
            .then(a.next_review_at().cmp(&b.next_review_at()))
            .then(b.created_at.cmp(&a.created_at))
    });
}

/// Select the cards of a challenge session
///
/// Never returns duplicate ids or more than `config.card_limit` cards. When
/// the pool fits within the limit the whole pool is returned shuffled.
pub fn select<R: Rng + ?Sized>(
    config: &ChallengeConfig,
    pool: &[Flashcard],
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<Flashcard> {
    let limit = config.card_limit;

    let mut seen = HashSet::new();
    let mut unique: Vec<Flashcard> = pool
        .iter()
        .filter(|c| seen.insert(c.id))
        .cloned()
        .collect();

    if unique.len() <= limit {
        unique.shuffle(rng);
        tracing::info!(
            "Challenge for deck {}: whole pool of {} card(s)",
            config.deck_id,
            unique.len()
        );
        return unique;
    }

    pre_order(&mut unique);

    let mut hard = Vec::new();
    let mut new = Vec::new();
    let mut due = Vec::new();
    let mut other = Vec::new();
    for card in unique {
        match bucket_of(&card, now) {
            Bucket::Hard => hard.push(card),
            Bucket::New => new.push(card),
            Bucket::Due => due.push(card),
            Bucket::Other => other.push(card),
        }
    }

    tracing::debug!(
        "Challenge buckets: hard={}, new={}, due={}, other={}",
        hard.len(),
        new.len(),
        due.len(),
        other.len()
    );

    let mut selected: Vec<Flashcard> = Vec::with_capacity(limit);
    let mut leftovers: Vec<Flashcard> = Vec::new();

    for (mut bucket, ceiling) in [
        (hard, cap(limit, 40)),
        (due, cap(limit, 70)),
        (new, cap(limit, 90)),
        (other, limit),
    ] {
        bucket.shuffle(rng);
        let room = ceiling.min(limit).saturating_sub(selected.len());
        let take = room.min(bucket.len());
        leftovers.extend(bucket.drain(take..));
        selected.extend(bucket);
    }

    // A bucket that ran out of room above may still have cards when later
    // buckets were short; top the session up from those.
    if selected.len() < limit && !leftovers.is_empty() {
        leftovers.shuffle(rng);
        let missing = limit - selected.len();
        selected.extend(leftovers.into_iter().take(missing));
    }

    selected.shuffle(rng);

    tracing::info!(
        "Challenge for deck {}: selected {} of {} card(s)",
        config.deck_id,
        selected.len(),
        pool.len()
    );
    selected
}
