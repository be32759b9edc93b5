//! Text helpers shared by the quiz generator and the hint engine.

use regex::RegexBuilder;
use unicode_normalization::UnicodeNormalization;

/// Marker that replaces a masked term
pub const BLANK: &str = "___";

/// Replace the first whole-word, case-insensitive occurrence of `term` in
/// `sentence` with [`BLANK`]
///
/// Returns `None` when the term does not occur as a whole word.
pub fn mask_term(sentence: &str, term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }

    let pattern = format!(r"\b{}\b", regex::escape(term));
    let re = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!("Unable to build mask pattern for {:?}: {}", term, e);
            return None;
        }
    };

    let found = re.find(sentence)?;
    let mut masked = String::with_capacity(sentence.len());
    masked.push_str(&sentence[..found.start()]);
    masked.push_str(BLANK);
    masked.push_str(&sentence[found.end()..]);
    Some(masked)
}

/// Normalize an answer for comparison: trimmed and lowercased
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Collation key for human-facing sorting: accents stripped, case folded
pub fn collation_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_whole_word_case_insensitive() {
        assert_eq!(
            mask_term("Serendipity led us here.", "serendipity").as_deref(),
            Some("___ led us here.")
        );
    }

    #[test]
    fn test_mask_only_first_occurrence() {
        assert_eq!(
            mask_term("run, run away", "run").as_deref(),
            Some("___, run away")
        );
    }

    #[test]
    fn test_mask_ignores_partial_words() {
        assert_eq!(mask_term("The cathedral was vast.", "cat"), None);
    }

    #[test]
    fn test_mask_escapes_regex_metacharacters() {
        assert_eq!(
            mask_term("We wrote C++ code today.", "C++"),
            None,
            "a trailing symbol has no word boundary after it"
        );
        assert_eq!(
            mask_term("Use a.b here", "a.b").as_deref(),
            Some("Use ___ here")
        );
        assert_eq!(mask_term("Use axb here", "a.b"), None);
    }

    #[test]
    fn test_mask_empty_term() {
        assert_eq!(mask_term("anything", "  "), None);
    }

    #[test]
    fn test_collation_key_strips_accents() {
        assert_eq!(collation_key("Écoute"), "ecoute");
        assert!(collation_key("éclair") < collation_key("Fromage"));
    }
}
