//! Shared English stop-word list used by keyword-overlap scoring, the
//! similarity check, and checkpoint drift detection (spec.md §4.4, §4.6,
//! §4.7). Deliberately small and hard-coded; it is not a linguistic
//! resource, just enough noise-filtering for substring/token heuristics.

use std::collections::HashSet;
use std::sync::OnceLock;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "else", "for", "of", "to", "in", "on",
    "at", "by", "with", "is", "are", "was", "were", "be", "been", "being", "this", "that",
    "these", "those", "it", "its", "as", "from", "into", "not", "no", "do", "does", "did",
    "have", "has", "had", "will", "would", "should", "can", "could", "may", "might", "must",
    "i", "you", "he", "she", "we", "they", "them", "their", "our", "your", "my",
];

fn stop_word_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

pub fn is_stop_word(token: &str) -> bool {
    stop_word_set().contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_stop_words() {
        assert!(is_stop_word("the"));
        assert!(is_stop_word("and"));
        assert!(!is_stop_word("parser"));
    }
}
