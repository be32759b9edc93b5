//! Record store interface and implementations.
//!
//! The engine talks to persisted flashcards and decks only through
//! [`CardStore`]. Two implementations ship with the crate:
//! - [`MemoryStore`]: everything in a `HashMap`, for tests and embedders
//! - [`JsonStore`]: one JSON document on disk, written atomically under an
//!   exclusive file lock

use crate::{
    CardId, Deck, DeckId, DeckMembership, Error, Flashcard, Result, Schedule,
};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// ============================================================================
// Queries
// ============================================================================

/// Ordering applied to a multi-card fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CardOrder {
    /// Next review ascending (never scheduled first), then creation ascending
    #[default]
    NextReview,
    /// Last review ascending (never reviewed first), then creation ascending
    LeastRecentlyReviewed,
    /// Creation ascending
    Created,
}

/// Filtered, ordered multi-card fetch
#[derive(Clone, Debug, PartialEq)]
pub struct CardQuery {
    pub deck: DeckId,
    /// Only cards due at this instant (next review absent or not after it)
    pub due_at: Option<DateTime<Utc>>,
    pub order: CardOrder,
}

impl CardQuery {
    /// All cards of a deck; the global deck means no deck filter
    pub fn deck(deck: DeckId) -> Self {
        Self {
            deck,
            due_at: None,
            order: CardOrder::default(),
        }
    }

    pub fn due_at(mut self, now: DateTime<Utc>) -> Self {
        self.due_at = Some(now);
        self
    }

    pub fn ordered_by(mut self, order: CardOrder) -> Self {
        self.order = order;
        self
    }

    /// Apply the due filter and ordering to cards already scoped to the deck
    pub fn apply(&self, mut cards: Vec<Flashcard>) -> Vec<Flashcard> {
        if let Some(now) = self.due_at {
            cards.retain(|c| c.is_due(now));
        }

        match self.order {
            CardOrder::NextReview => cards.sort_by(|a, b| {
                a.next_review_at()
                    .cmp(&b.next_review_at())
                    .then(a.created_at.cmp(&b.created_at))
            }),
            CardOrder::LeastRecentlyReviewed => cards.sort_by(|a, b| {
                a.last_reviewed_at()
                    .cmp(&b.last_reviewed_at())
                    .then(a.created_at.cmp(&b.created_at))
            }),
            CardOrder::Created => cards.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }

        cards
    }
}

// ============================================================================
// Store traits
// ============================================================================

/// What the engine needs from persistence
pub trait CardStore {
    fn get_card(&self, id: CardId) -> Result<Option<Flashcard>>;

    fn query_cards(&self, query: &CardQuery) -> Result<Vec<Flashcard>>;

    /// Overwrite only the scheduling fields (and `updated_at`) of a card
    ///
    /// Returns the updated card, or `None` if no card has this id.
    fn update_schedule(
        &mut self,
        id: CardId,
        schedule: &Schedule,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Flashcard>>;

    fn list_decks(&self) -> Result<Vec<Deck>>;

    fn list_memberships(&self) -> Result<Vec<DeckMembership>>;
}

/// Content editing, used by the CLI to seed data
pub trait CardEditor {
    fn insert_card(&mut self, card: Flashcard) -> Result<()>;

    fn insert_deck(&mut self, deck: Deck) -> Result<()>;

    fn add_to_deck(&mut self, deck_id: &DeckId, card_id: CardId) -> Result<()>;

    /// Insert a card straight into a deck, creating the deck if no deck with
    /// its id exists yet. Nothing is written when any step fails.
    fn insert_card_in_deck(&mut self, card: Flashcard, deck: Deck) -> Result<()>;
}

// ============================================================================
// Shared document
// ============================================================================

/// Whole store contents; also the on-disk format of [`JsonStore`]
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct StoreData {
    #[serde(default)]
    pub cards: HashMap<CardId, Flashcard>,
    #[serde(default)]
    pub decks: Vec<Deck>,
    #[serde(default)]
    pub memberships: Vec<DeckMembership>,
}

impl StoreData {
    fn query(&self, query: &CardQuery) -> Vec<Flashcard> {
        let scoped: Vec<Flashcard> = if query.deck.is_global() {
            self.cards.values().cloned().collect()
        } else {
            let members: HashSet<CardId> = self
                .memberships
                .iter()
                .filter(|m| m.deck_id == query.deck)
                .map(|m| m.flashcard_id)
                .collect();
            self.cards
                .values()
                .filter(|c| members.contains(&c.id))
                .cloned()
                .collect()
        };
        query.apply(scoped)
    }

    fn update_schedule(
        &mut self,
        id: CardId,
        schedule: &Schedule,
        updated_at: DateTime<Utc>,
    ) -> Option<Flashcard> {
        let card = self.cards.get_mut(&id)?;
        card.apply_schedule(schedule.clone(), updated_at);
        Some(card.clone())
    }

    fn insert_card(&mut self, card: Flashcard) -> Result<()> {
        if self.cards.contains_key(&card.id) {
            return Err(Error::Store(format!("card {} already exists", card.id)));
        }
        self.cards.insert(card.id, card);
        Ok(())
    }

    fn insert_deck(&mut self, deck: Deck) -> Result<()> {
        if deck.id.is_global() {
            return Err(Error::InvalidArgument(format!(
                "deck id '{}' is reserved",
                deck.id
            )));
        }
        if self.decks.iter().any(|d| d.id == deck.id) {
            return Err(Error::Store(format!("deck '{}' already exists", deck.id)));
        }
        self.decks.push(deck);
        Ok(())
    }

    fn insert_card_in_deck(&mut self, card: Flashcard, deck: Deck) -> Result<()> {
        if deck.id.is_global() {
            return Err(Error::InvalidArgument(format!(
                "deck id '{}' is reserved",
                deck.id
            )));
        }
        if self.cards.contains_key(&card.id) {
            return Err(Error::Store(format!("card {} already exists", card.id)));
        }

        let deck_id = deck.id.clone();
        let card_id = card.id;
        if !self.decks.iter().any(|d| d.id == deck_id) {
            self.decks.push(deck);
        }
        self.cards.insert(card_id, card);
        self.memberships.push(DeckMembership {
            deck_id,
            flashcard_id: card_id,
        });
        Ok(())
    }

    fn add_to_deck(&mut self, deck_id: &DeckId, card_id: CardId) -> Result<()> {
        if !self.decks.iter().any(|d| &d.id == deck_id) {
            return Err(Error::Store(format!("no deck '{}'", deck_id)));
        }
        if !self.cards.contains_key(&card_id) {
            return Err(Error::Store(format!("no card {}", card_id)));
        }

        let membership = DeckMembership {
            deck_id: deck_id.clone(),
            flashcard_id: card_id,
        };
        if !self.memberships.contains(&membership) {
            self.memberships.push(membership);
        }
        Ok(())
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory store
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    data: StoreData,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: StoreData) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }
}

impl CardStore for MemoryStore {
    fn get_card(&self, id: CardId) -> Result<Option<Flashcard>> {
        Ok(self.data.cards.get(&id).cloned())
    }

    fn query_cards(&self, query: &CardQuery) -> Result<Vec<Flashcard>> {
        Ok(self.data.query(query))
    }

    fn update_schedule(
        &mut self,
        id: CardId,
        schedule: &Schedule,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Flashcard>> {
        Ok(self.data.update_schedule(id, schedule, updated_at))
    }

    fn list_decks(&self) -> Result<Vec<Deck>> {
        Ok(self.data.decks.clone())
    }

    fn list_memberships(&self) -> Result<Vec<DeckMembership>> {
        Ok(self.data.memberships.clone())
    }
}

impl CardEditor for MemoryStore {
    fn insert_card(&mut self, card: Flashcard) -> Result<()> {
        self.data.insert_card(card)
    }

    fn insert_deck(&mut self, deck: Deck) -> Result<()> {
        self.data.insert_deck(deck)
    }

    fn add_to_deck(&mut self, deck_id: &DeckId, card_id: CardId) -> Result<()> {
        self.data.add_to_deck(deck_id, card_id)
    }

    fn insert_card_in_deck(&mut self, card: Flashcard, deck: Deck) -> Result<()> {
        self.data.insert_card_in_deck(card, deck)
    }
}

// ============================================================================
// JsonStore
// ============================================================================

/// File-backed store holding one JSON document
///
/// Reads take a shared lock; writes go to a temp file in the same directory
/// that is locked, synced and renamed over the original.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole document
    ///
    /// A missing file is an empty store. A file that does not parse is an
    /// `Error::Store`, for reads and writes alike.
    pub fn load(&self) -> Result<StoreData> {
        match self.read_document()? {
            Some(contents) => serde_json::from_str::<StoreData>(&contents).map_err(|e| {
                tracing::warn!("Failed to parse store file {:?}: {}", self.path, e);
                Error::Store(format!("unreadable store {:?}: {}", self.path, e))
            }),
            None => Ok(StoreData::default()),
        }
    }

    fn read_document(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            tracing::debug!("No store file at {:?}", self.path);
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        Ok(Some(contents))
    }

    /// Atomically write the document
    pub fn save(&self, data: &StoreData) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::Store(format!("store path {:?} has no parent", self.path))
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(data)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved store with {} cards to {:?}", data.cards.len(), self.path);
        Ok(())
    }

    /// Load, modify and save back
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut StoreData) -> Result<T>,
    {
        let mut data = self.load()?;
        let out = f(&mut data)?;
        self.save(&data)?;
        Ok(out)
    }
}

impl CardStore for JsonStore {
    fn get_card(&self, id: CardId) -> Result<Option<Flashcard>> {
        Ok(self.load()?.cards.remove(&id))
    }

    fn query_cards(&self, query: &CardQuery) -> Result<Vec<Flashcard>> {
        Ok(self.load()?.query(query))
    }

    fn update_schedule(
        &mut self,
        id: CardId,
        schedule: &Schedule,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Flashcard>> {
        let mut data = self.load()?;
        let updated = data.update_schedule(id, schedule, updated_at);
        if updated.is_some() {
            self.save(&data)?;
        }
        Ok(updated)
    }

    fn list_decks(&self) -> Result<Vec<Deck>> {
        Ok(self.load()?.decks)
    }

    fn list_memberships(&self) -> Result<Vec<DeckMembership>> {
        Ok(self.load()?.memberships)
    }
}

impl CardEditor for JsonStore {
    fn insert_card(&mut self, card: Flashcard) -> Result<()> {
        self.update(|data| data.insert_card(card))
    }

    fn insert_deck(&mut self, deck: Deck) -> Result<()> {
        self.update(|data| data.insert_deck(deck))
    }

    fn add_to_deck(&mut self, deck_id: &DeckId, card_id: CardId) -> Result<()> {
        self.update(|data| data.add_to_deck(deck_id, card_id))
    }

    fn insert_card_in_deck(&mut self, card: Flashcard, deck: Deck) -> Result<()> {
        self.update(|data| data.insert_card_in_deck(card, deck))
    }
}
