//! Progressive hints and the quality penalty for using them.
//!
//! Hints are revealed in a fixed order (first letter, word length, context
//! sentence) and a question never gets the same hint twice.

use crate::text::mask_term;
use crate::types::{Flashcard, Hint, HintType, Quality};

/// Next hint in the progression that has not been used yet
pub fn next_hint(card: &Flashcard, used: &[HintType]) -> Option<Hint> {
    let kind = HintType::PROGRESSION
        .into_iter()
        .find(|kind| !used.contains(kind))?;

    Some(Hint {
        kind,
        content: hint_content(card, kind),
    })
}

/// Content of a specific hint type for a card
pub fn hint_content(card: &Flashcard, kind: HintType) -> String {
    match kind {
        HintType::FirstLetter => first_letter(&card.term),
        HintType::WordLength => card.term.trim().chars().count().to_string(),
        HintType::ContextSentence => context_sentence(card),
    }
}

fn first_letter(term: &str) -> String {
    term.trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

fn context_sentence(card: &Flashcard) -> String {
    match card.context.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => mask_term(context, &card.term).unwrap_or_else(|| context.to_string()),
        None => {
            let definition = card.definition.trim();
            let half = definition.chars().count() / 2;
            let head: String = definition.chars().take(half).collect();
            format!("{}...", head.trim_end())
        }
    }
}

/// Lower a quality verdict by the number of hints used, snapping down to the
/// nearest valid verdict
pub fn apply_penalty(base: Quality, hints_used: usize) -> Quality {
    if hints_used == 0 {
        return base;
    }

    let penalized = i64::from(base.value()) - hints_used as i64;
    if penalized >= 5 {
        Quality::Easy
    } else if penalized >= 3 {
        Quality::Correct
    } else {
        Quality::Difficult
    }
}

/// Hints revealed so far for one question
///
/// Reveals only move forward; once all three hints are out, further reveals
/// return `None`.
#[derive(Clone, Debug, Default)]
pub struct HintProgress {
    revealed: Vec<Hint>,
}

impl HintProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reveal the next hint for `card`
    pub fn reveal(&mut self, card: &Flashcard) -> Option<&Hint> {
        let used = self.used_types();
        let hint = next_hint(card, &used)?;
        tracing::debug!("Revealing {:?} hint for card {}", hint.kind, card.id);
        self.revealed.push(hint);
        self.revealed.last()
    }

    pub fn revealed(&self) -> &[Hint] {
        &self.revealed
    }

    pub fn used_types(&self) -> Vec<HintType> {
        self.revealed.iter().map(|h| h.kind).collect()
    }

    pub fn hints_used(&self) -> usize {
        self.revealed.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.revealed.len() >= HintType::PROGRESSION.len()
    }

    /// Quality to submit for this question after hints
    pub fn penalize(&self, base: Quality) -> Quality {
        apply_penalty(base, self.hints_used())
    }
}
