//! Quiz generation and grading.
//!
//! Questions alternate between multiple choice and fill-in-the-blank by
//! position so every quiz of two or more questions mixes both types.

use crate::text::{mask_term, normalize_answer, BLANK};
use crate::{Flashcard, QuestionKind, QuizQuestion};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use uuid::Uuid;

/// Options shown for every multiple-choice question
pub const OPTION_COUNT: usize = 4;

/// Build up to `count` questions from `pool`
///
/// Returns `min(count, pool.len())` questions; an empty pool yields an empty
/// quiz.
pub fn generate<R: Rng + ?Sized>(pool: &[Flashcard], count: usize, rng: &mut R) -> Vec<QuizQuestion> {
    let mut picked: Vec<&Flashcard> = pool.iter().collect();
    picked.shuffle(rng);
    picked.truncate(count);

    let mut questions = Vec::with_capacity(picked.len());
    for (index, card) in picked.into_iter().enumerate() {
        let question = if index % 2 == 0 {
            multiple_choice(card, pool, rng)
        } else {
            fill_in_the_blank(card)
        };
        questions.push(question);
    }

    tracing::info!(
        "Generated {} quiz question(s) from a pool of {}",
        questions.len(),
        pool.len()
    );
    questions
}

/// Multiple-choice question asking for the definition of a term
pub fn multiple_choice<R: Rng + ?Sized>(
    card: &Flashcard,
    pool: &[Flashcard],
    rng: &mut R,
) -> QuizQuestion {
    let correct = card.definition.clone();

    let mut others: Vec<&Flashcard> = pool.iter().filter(|c| c.id != card.id).collect();
    others.shuffle(rng);

    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(normalize_answer(&correct));

    let mut options = vec![correct.clone()];
    for other in others {
        if options.len() == OPTION_COUNT {
            break;
        }
        if seen.insert(normalize_answer(&other.definition)) {
            options.push(other.definition.clone());
        }
    }

    // Small pools still get four options
    let mut filler = 1;
    while options.len() < OPTION_COUNT {
        let placeholder = if filler == 1 {
            format!("Not: {}", correct)
        } else {
            format!("Not: {} ({})", correct, filler)
        };
        filler += 1;
        if seen.insert(normalize_answer(&placeholder)) {
            options.push(placeholder);
        }
    }

    options.shuffle(rng);

    QuizQuestion {
        id: Uuid::new_v4(),
        source: card.clone(),
        question_text: format!("What does \"{}\" mean?", card.term),
        correct_answer: correct,
        kind: QuestionKind::MultipleChoice { options },
    }
}

/// Fill-in-the-blank question asking for the term itself
pub fn fill_in_the_blank(card: &Flashcard) -> QuizQuestion {
    let sentence = card
        .context
        .as_deref()
        .and_then(|context| mask_term(context, &card.term))
        .unwrap_or_else(|| format!("The word {} means \"{}\".", BLANK, card.definition));

    QuizQuestion {
        id: Uuid::new_v4(),
        source: card.clone(),
        question_text: "Fill in the blank".to_string(),
        correct_answer: normalize_answer(&card.term),
        kind: QuestionKind::FillInTheBlank {
            sentence_with_blank: sentence,
        },
    }
}

/// Grade an answer: trimmed, case-insensitive equality
pub fn evaluate(user_answer: &str, correct_answer: &str) -> bool {
    normalize_answer(user_answer) == normalize_answer(correct_answer)
}
