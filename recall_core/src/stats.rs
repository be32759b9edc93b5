//! Mastery statistics across all decks.
//!
//! One full card fetch and one membership fetch feed every deck's numbers,
//! so the cost does not grow with the number of decks.

use crate::classifier::{classify_many_with, progress, MasteryThresholds};
use crate::store::{CardQuery, CardStore};
use crate::text::collation_key;
use crate::{CardCounts, CardId, DeckId, Flashcard, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Counts and progress for one scope (a deck, or every card)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ScopeStats {
    pub counts: CardCounts,
    pub progress: u8,
}

impl ScopeStats {
    fn from_counts(counts: CardCounts) -> Self {
        Self {
            counts,
            progress: progress(&counts),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeckStats {
    pub deck_id: DeckId,
    pub name: String,
    pub stats: ScopeStats,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AllStats {
    pub global: ScopeStats,
    pub decks: Vec<DeckStats>,
}

/// Deck list sort orders
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeckSortKey {
    ProgressAsc,
    ProgressDesc,
    NameAsc,
    NameDesc,
}

impl std::str::FromStr for DeckSortKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "progress-asc" => Ok(DeckSortKey::ProgressAsc),
            "progress-desc" => Ok(DeckSortKey::ProgressDesc),
            "name-asc" => Ok(DeckSortKey::NameAsc),
            "name-desc" => Ok(DeckSortKey::NameDesc),
            _ => Err(crate::Error::InvalidArgument(format!(
                "unknown deck sort '{}'",
                s
            ))),
        }
    }
}

pub struct StatisticsAggregator<'a, S> {
    store: &'a S,
    thresholds: MasteryThresholds,
}

impl<'a, S: CardStore> StatisticsAggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            thresholds: MasteryThresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: MasteryThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Global and per-deck statistics, decks in store order
    pub fn compute_all(&self, now: DateTime<Utc>) -> Result<AllStats> {
        let cards = self.store.query_cards(&CardQuery::deck(DeckId::global()))?;
        let decks = self.store.list_decks()?;
        let memberships = self.store.list_memberships()?;

        let by_id: HashMap<CardId, &Flashcard> = cards.iter().map(|c| (c.id, c)).collect();

        let mut by_deck: HashMap<&DeckId, Vec<&Flashcard>> = HashMap::new();
        for membership in &memberships {
            match by_id.get(&membership.flashcard_id) {
                Some(card) => by_deck.entry(&membership.deck_id).or_default().push(*card),
                None => tracing::warn!(
                    "Deck {} references missing card {}",
                    membership.deck_id,
                    membership.flashcard_id
                ),
            }
        }

        let global = ScopeStats::from_counts(classify_many_with(&cards, now, &self.thresholds));

        let deck_stats: Vec<DeckStats> = decks
            .iter()
            .map(|deck| {
                let members = by_deck.get(&deck.id).map(Vec::as_slice).unwrap_or(&[]);
                let counts = classify_many_with(members.iter().copied(), now, &self.thresholds);
                DeckStats {
                    deck_id: deck.id.clone(),
                    name: deck.name.clone(),
                    stats: ScopeStats::from_counts(counts),
                }
            })
            .collect();

        tracing::info!(
            "Computed statistics for {} card(s) across {} deck(s)",
            cards.len(),
            deck_stats.len()
        );

        Ok(AllStats {
            global,
            decks: deck_stats,
        })
    }
}

fn compare_names(a: &DeckStats, b: &DeckStats) -> Ordering {
    collation_key(&a.name)
        .cmp(&collation_key(&b.name))
        .then_with(|| a.name.cmp(&b.name))
}

/// Sorted copy of `decks`; the input is left untouched
pub fn sort_decks(decks: &[DeckStats], key: DeckSortKey) -> Vec<DeckStats> {
    let mut sorted = decks.to_vec();
    match key {
        DeckSortKey::ProgressAsc => sorted.sort_by_key(|d| d.stats.progress),
        DeckSortKey::ProgressDesc => {
            sorted.sort_by(|a, b| b.stats.progress.cmp(&a.stats.progress))
        }
        DeckSortKey::NameAsc => sorted.sort_by(compare_names),
        DeckSortKey::NameDesc => sorted.sort_by(|a, b| compare_names(b, a)),
    }
    sorted
}
