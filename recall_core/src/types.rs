//! Core domain types for the Recall engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Flashcards and their opaque scheduling state
//! - Decks and deck membership
//! - Quality verdicts and review inputs
//! - Derived values (mastery categories, counts, quiz questions, hints)

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a flashcard
pub type CardId = Uuid;

/// Reserved deck identifier meaning "all cards, no deck filter"
pub const GLOBAL_DECK_ID: &str = "__all__";

/// Initial ease factor for a card that has never been reviewed
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Ease factor floor
pub const MIN_EASE_FACTOR: f64 = 1.3;

// ============================================================================
// Deck Types
// ============================================================================

/// Identifier of a deck
///
/// The reserved [`GLOBAL_DECK_ID`] is a virtual deck covering every card; it
/// never corresponds to a persisted [`Deck`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckId(String);

impl DeckId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The virtual "all cards" deck
    pub fn global() -> Self {
        Self(GLOBAL_DECK_ID.to_string())
    }

    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL_DECK_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeckId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A named collection of flashcards
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One row of the deck ↔ flashcard relationship
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DeckMembership {
    pub deck_id: DeckId,
    pub flashcard_id: CardId,
}

// ============================================================================
// Flashcard and Schedule
// ============================================================================

/// Scheduling state of a flashcard
///
/// Fields are read-only outside the crate: the only way to obtain a
/// non-initial schedule is through [`crate::sm2::compute`] applied by the
/// [`crate::review::ReviewCoordinator`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(from = "ScheduleFields")]
pub struct Schedule {
    repetitions: u32,
    interval_days: u32,
    ease_factor: f64,
    last_reviewed_at: Option<DateTime<Utc>>,
    next_review_at: Option<DateTime<Utc>>,
}

/// Persisted scheduling fields, clamped on the way in
#[derive(Deserialize)]
struct ScheduleFields {
    repetitions: u32,
    interval_days: u32,
    ease_factor: f64,
    last_reviewed_at: Option<DateTime<Utc>>,
    next_review_at: Option<DateTime<Utc>>,
}

impl From<ScheduleFields> for Schedule {
    fn from(f: ScheduleFields) -> Self {
        Schedule::from_parts(
            f.repetitions,
            f.interval_days,
            f.ease_factor,
            f.last_reviewed_at,
            f.next_review_at,
        )
    }
}

impl Schedule {
    /// Schedule of a card that has never been reviewed
    pub(crate) fn initial() -> Self {
        Self {
            repetitions: 0,
            interval_days: 1,
            ease_factor: DEFAULT_EASE_FACTOR,
            last_reviewed_at: None,
            next_review_at: None,
        }
    }

    pub(crate) fn from_parts(
        repetitions: u32,
        interval_days: u32,
        ease_factor: f64,
        last_reviewed_at: Option<DateTime<Utc>>,
        next_review_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            repetitions,
            interval_days: interval_days.max(1),
            ease_factor: ease_factor.max(MIN_EASE_FACTOR),
            last_reviewed_at,
            next_review_at,
        }
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    pub fn interval_days(&self) -> u32 {
        self.interval_days
    }

    pub fn ease_factor(&self) -> f64 {
        self.ease_factor
    }

    pub fn last_reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed_at
    }

    pub fn next_review_at(&self) -> Option<DateTime<Utc>> {
        self.next_review_at
    }

    /// Absent next review means "due immediately"
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at.map_or(true, |at| at <= now)
    }
}

/// A learning item under spaced repetition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Flashcard {
    pub id: CardId,
    pub term: String,
    pub definition: String,
    pub context: Option<String>,
    #[serde(flatten)]
    schedule: Schedule,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flashcard {
    /// Create a fresh, never-reviewed card
    pub fn new(
        term: impl Into<String>,
        definition: impl Into<String>,
        context: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            term: term.into(),
            definition: definition.into(),
            context,
            schedule: Schedule::initial(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn repetitions(&self) -> u32 {
        self.schedule.repetitions
    }

    pub fn interval_days(&self) -> u32 {
        self.schedule.interval_days
    }

    pub fn ease_factor(&self) -> f64 {
        self.schedule.ease_factor
    }

    pub fn last_reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.schedule.last_reviewed_at
    }

    pub fn next_review_at(&self) -> Option<DateTime<Utc>> {
        self.schedule.next_review_at
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.schedule.is_due(now)
    }

    /// Replace the scheduling fields, stamping `updated_at`
    pub(crate) fn apply_schedule(&mut self, schedule: Schedule, now: DateTime<Utc>) {
        self.schedule = schedule;
        self.updated_at = now;
    }
}

// ============================================================================
// Review Types
// ============================================================================

/// Discrete outcome of a review attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Quality {
    /// Failed recall
    Difficult = 1,
    Correct = 3,
    Easy = 5,
}

impl Quality {
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Anything below 3 counts as a failed review
    pub fn is_passing(self) -> bool {
        self.value() >= 3
    }

    /// UI-facing label
    pub fn label(self) -> &'static str {
        match self {
            Quality::Difficult => "Difficult",
            Quality::Correct => "Correct",
            Quality::Easy => "Easy",
        }
    }
}

impl TryFrom<u8> for Quality {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Quality::Difficult),
            3 => Ok(Quality::Correct),
            5 => Ok(Quality::Easy),
            other => Err(Error::InvalidArgument(format!(
                "quality must be one of 1, 3, 5 (got {})",
                other
            ))),
        }
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.value()
    }
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "difficult" => Ok(Quality::Difficult),
            "correct" => Ok(Quality::Correct),
            "easy" => Ok(Quality::Easy),
            other => {
                let value: u8 = other.parse().map_err(|_| {
                    Error::InvalidArgument(format!("unknown quality '{}'", s))
                })?;
                Quality::try_from(value)
            }
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value(), self.label())
    }
}

/// Where a review verdict came from, kept for analytics
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSource {
    #[default]
    Review,
    Practice,
    Quiz,
    Challenge,
}

impl FromStr for ReviewSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "review" => Ok(ReviewSource::Review),
            "practice" => Ok(ReviewSource::Practice),
            "quiz" => Ok(ReviewSource::Quiz),
            "challenge" => Ok(ReviewSource::Challenge),
            _ => Err(Error::InvalidArgument(format!("unknown review source '{}'", s))),
        }
    }
}

/// A single review submission
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReviewInput {
    pub flashcard_id: CardId,
    pub quality: Quality,
    pub source: ReviewSource,
}

// ============================================================================
// Derived Types
// ============================================================================

/// Mastery bucket of a card, derived on demand
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CardCategory {
    Unseen,
    Learning,
    ToReview,
    Mastered,
}

/// Per-category tallies; the four buckets always sum to `total`
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CardCounts {
    pub total: usize,
    pub mastered: usize,
    pub learning: usize,
    pub to_review: usize,
    pub unseen: usize,
}

impl CardCounts {
    pub fn record(&mut self, category: CardCategory) {
        self.total += 1;
        match category {
            CardCategory::Unseen => self.unseen += 1,
            CardCategory::Learning => self.learning += 1,
            CardCategory::ToReview => self.to_review += 1,
            CardCategory::Mastered => self.mastered += 1,
        }
    }
}

/// Payload of a quiz question, one shape per question type
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice { options: Vec<String> },
    FillInTheBlank { sentence_with_blank: String },
}

/// A generated quiz question; never persisted
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
    pub id: Uuid,
    pub source: Flashcard,
    pub question_text: String,
    pub correct_answer: String,
    pub kind: QuestionKind,
}

/// Kind of hint, listed in reveal order
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HintType {
    FirstLetter,
    WordLength,
    ContextSentence,
}

impl HintType {
    /// Fixed reveal order
    pub const PROGRESSION: [HintType; 3] = [
        HintType::FirstLetter,
        HintType::WordLength,
        HintType::ContextSentence,
    ];
}

impl FromStr for HintType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "first_letter" => Ok(HintType::FirstLetter),
            "word_length" => Ok(HintType::WordLength),
            "context_sentence" => Ok(HintType::ContextSentence),
            _ => Err(Error::InvalidArgument(format!("unknown hint type '{}'", s))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hint {
    #[serde(rename = "type")]
    pub kind: HintType,
    pub content: String,
}

/// Parameters of a challenge session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChallengeConfig {
    pub deck_id: DeckId,
    pub card_limit: usize,
}
