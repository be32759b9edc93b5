//! Review coordination.
//!
//! The [`ReviewCoordinator`] is the single write path for scheduling fields:
//! it loads a card, runs one SM-2 step and writes the new schedule back. It
//! also serves the pool-building queries the practice screens start from.

use crate::review_log::{ReviewRecord, ReviewSink};
use crate::store::{CardOrder, CardQuery, CardStore};
use crate::{sm2, DeckId, Flashcard, Result, ReviewInput};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

pub struct ReviewCoordinator<S> {
    store: S,
    review_log: Option<Box<dyn ReviewSink>>,
}

impl<S: CardStore> ReviewCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            review_log: None,
        }
    }

    /// Append every applied review to `sink`
    pub fn with_review_log(mut self, sink: impl ReviewSink + 'static) -> Self {
        self.review_log = Some(Box::new(sink));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Apply one review verdict
    ///
    /// Returns `Ok(None)` without touching the store when the card does not
    /// exist. Concurrent reviews of the same card are last-write-wins; callers
    /// submit one review per card at a time.
    pub fn apply_review(
        &mut self,
        input: &ReviewInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Flashcard>> {
        let Some(card) = self.store.get_card(input.flashcard_id)? else {
            tracing::info!("Review skipped: no flashcard {}", input.flashcard_id);
            return Ok(None);
        };

        let result = sm2::compute_from(input.quality, card.schedule(), now);
        let schedule = result.into_schedule(now);

        let Some(updated) = self.store.update_schedule(card.id, &schedule, now)? else {
            tracing::warn!("Flashcard {} vanished before its review was saved", card.id);
            return Ok(None);
        };

        tracing::info!(
            "Reviewed {:?} with quality {}: next in {} day(s), ease {:.2}",
            updated.term,
            input.quality.value(),
            updated.interval_days(),
            updated.ease_factor()
        );

        if let Some(log) = self.review_log.as_mut() {
            let record = ReviewRecord {
                id: Uuid::new_v4(),
                flashcard_id: updated.id,
                quality: input.quality,
                source: input.source,
                reviewed_at: now,
                interval_days: updated.interval_days(),
                ease_factor: updated.ease_factor(),
            };
            if let Err(e) = log.append(&record) {
                tracing::warn!("Failed to log review of {}: {}", updated.id, e);
            }
        }

        Ok(Some(updated))
    }

    /// Cards due at `now`, never-scheduled cards first, then by next review
    /// and creation time
    pub fn get_due_flashcards(&self, deck: &DeckId, now: DateTime<Utc>) -> Result<Vec<Flashcard>> {
        let query = CardQuery::deck(deck.clone())
            .due_at(now)
            .ordered_by(CardOrder::NextReview);
        let cards = self.store.query_cards(&query)?;
        tracing::debug!("{} due card(s) in deck {}", cards.len(), deck);
        Ok(cards)
    }

    /// Every card of the deck, least recently reviewed first
    pub fn get_all_flashcards_for_deck(&self, deck: &DeckId) -> Result<Vec<Flashcard>> {
        let query = CardQuery::deck(deck.clone()).ordered_by(CardOrder::LeastRecentlyReviewed);
        self.store.query_cards(&query)
    }

    /// Up to `count` cards for a quiz, due cards preferred
    ///
    /// Due and not-due cards are shuffled separately, due cards are taken
    /// first and the remainder is padded from the rest; the combined
    /// selection is shuffled again.
    pub fn get_quiz_flashcards<R: Rng + ?Sized>(
        &self,
        deck: &DeckId,
        count: usize,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Vec<Flashcard>> {
        let cards = self
            .store
            .query_cards(&CardQuery::deck(deck.clone()).ordered_by(CardOrder::Created))?;

        let (mut due, mut rest): (Vec<_>, Vec<_>) = cards.into_iter().partition(|c| c.is_due(now));
        due.shuffle(rng);
        rest.shuffle(rng);

        let due_count = due.len();
        let mut selected: Vec<Flashcard> = due.into_iter().take(count).collect();
        let missing = count.saturating_sub(selected.len());
        selected.extend(rest.into_iter().take(missing));
        selected.shuffle(rng);

        tracing::debug!(
            "Quiz pool for deck {}: {} card(s) ({} due available)",
            deck,
            selected.len(),
            due_count
        );
        Ok(selected)
    }
}
