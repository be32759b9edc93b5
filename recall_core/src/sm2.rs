//! SM-2 scheduling.
//!
//! Maps a quality verdict and the prior schedule to the next schedule. Pure:
//! the current time is always passed in.

use crate::types::{Quality, Schedule, MIN_EASE_FACTOR};
use chrono::{DateTime, Duration, Utc};

/// Output of one SM-2 step
#[derive(Clone, Debug, PartialEq)]
pub struct Sm2Result {
    pub repetitions: u32,
    pub interval_days: u32,
    pub ease_factor: f64,
    pub next_review_at: DateTime<Utc>,
}

impl Sm2Result {
    /// Turn the result into the schedule persisted on the card
    pub(crate) fn into_schedule(self, reviewed_at: DateTime<Utc>) -> Schedule {
        Schedule::from_parts(
            self.repetitions,
            self.interval_days,
            self.ease_factor,
            Some(reviewed_at),
            Some(self.next_review_at),
        )
    }
}

/// Compute the next schedule
///
/// - Failed (quality < 3): repetitions reset to 0, interval back to 1 day
/// - Passed: repetitions + 1; interval 1, then 6, then `interval × ease`
/// - Ease moves by `0.1 − (5−q)(0.08 + (5−q)0.02)`, floored at 1.3 and
///   rounded to two decimals
pub fn compute(
    quality: Quality,
    repetitions: u32,
    interval_days: u32,
    ease_factor: f64,
    now: DateTime<Utc>,
) -> Sm2Result {
    let (repetitions, interval_days) = if quality.is_passing() {
        let repetitions = repetitions + 1;
        let interval = match repetitions {
            1 => 1,
            2 => 6,
            _ => (f64::from(interval_days) * ease_factor).round() as u32,
        };
        (repetitions, interval.max(1))
    } else {
        (0, 1)
    };

    let q = f64::from(5 - quality.value());
    let ease_factor = (ease_factor + (0.1 - q * (0.08 + q * 0.02))).max(MIN_EASE_FACTOR);
    let ease_factor = (ease_factor * 100.0).round() / 100.0;

    let next_review_at = now + Duration::days(i64::from(interval_days));

    tracing::debug!(
        "SM-2 step: quality={} -> reps={}, interval={}d, ease={:.2}",
        quality.value(),
        repetitions,
        interval_days,
        ease_factor
    );

    Sm2Result {
        repetitions,
        interval_days,
        ease_factor,
        next_review_at,
    }
}

/// Convenience wrapper taking the prior state from a [`Schedule`]
pub fn compute_from(quality: Quality, schedule: &Schedule, now: DateTime<Utc>) -> Sm2Result {
    compute(
        quality,
        schedule.repetitions(),
        schedule.interval_days(),
        schedule.ease_factor(),
        now,
    )
}
