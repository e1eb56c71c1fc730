//! Tokenization, word-overlap scoring, and glob/substring file-pattern
//! matching used throughout the Attribution Engine, Feature Store
//! similarity check, and Plan/Step drift detection.

use crate::stopwords::is_stop_word;
use std::collections::BTreeSet;

/// Lower-case, split on non-alphanumeric runs, drop stop words and empty
/// tokens. Deterministic; no embeddings (spec.md §4.4).
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !is_stop_word(t))
        .map(String::from)
        .collect()
}

/// Fraction of `candidate`'s tokens that also appear in `reference`, in
/// `[0.0, 1.0]`. Used by the similarity check (>60% word-overlap) and by
/// scored matching's keyword-overlap term.
pub fn word_overlap_ratio(candidate: &str, reference: &str) -> f64 {
    let cand = tokenize(candidate);
    if cand.is_empty() {
        return 0.0;
    }
    let reference = tokenize(reference);
    let overlap = cand.intersection(&reference).count();
    overlap as f64 / cand.len() as f64
}

/// Raw token-overlap count (not ratio) against `reference`'s token set --
/// used by the Attribution Engine's `+0.3 × (overlap / max(|feature_kw|,1))`
/// term, where the denominator is specifically the feature side's token
/// count rather than the event side's.
pub fn token_overlap_count(a: &BTreeSet<String>, b: &BTreeSet<String>) -> usize {
    a.intersection(b).count()
}

/// True if `description` and `other` share zero non-stop-word tokens, and
/// both are non-empty -- the drift-detection predicate (spec.md §4.7).
pub fn shares_no_tokens(description: &str, other: &str) -> bool {
    let a = tokenize(description);
    let b = tokenize(other);
    !a.is_empty() && !b.is_empty() && a.is_disjoint(&b)
}

/// fnmatch-style glob match (`*` and `?` only) OR plain substring
/// containment, matching spec.md §4.6's "globs in file_patterns vs event's
/// file_path via fnmatch OR substring containment".
pub fn file_pattern_matches(pattern: &str, path: &str) -> bool {
    if path.contains(pattern) {
        return true;
    }
    glob_match(pattern, path)
}

fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    match_from(&p, 0, &t, 0)
}

fn match_from(p: &[char], pi: usize, t: &[char], ti: usize) -> bool {
    if pi == p.len() {
        return ti == t.len();
    }
    match p[pi] {
        '*' => {
            for skip in ti..=t.len() {
                if match_from(p, pi + 1, t, skip) {
                    return true;
                }
            }
            false
        }
        '?' => ti < t.len() && match_from(p, pi + 1, t, ti + 1),
        c => ti < t.len() && t[ti] == c && match_from(p, pi + 1, t, ti + 1),
    }
}

/// Substring-based "command contains any of these keywords" check used by
/// completion-criteria evaluation (spec.md §4.8).
pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    needles.iter().any(|n| haystack.contains(&n.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_stop_words_and_punctuation() {
        let tokens = tokenize("Fix the parser for edge cases!");
        assert!(tokens.contains("parser"));
        assert!(tokens.contains("edge"));
        assert!(!tokens.contains("the"));
        assert!(!tokens.contains("for"));
    }

    #[test]
    fn word_overlap_ratio_is_candidate_relative() {
        let ratio = word_overlap_ratio("parser tests", "rewrite the parser module");
        assert!(ratio > 0.49 && ratio < 0.51);
    }

    #[test]
    fn shares_no_tokens_detects_drift() {
        assert!(shares_no_tokens("update UI colours", "Write parser"));
        assert!(!shares_no_tokens("write the parser", "Write parser module"));
    }

    #[test]
    fn glob_and_substring_matching() {
        assert!(file_pattern_matches("*.rs", "src/main.rs"));
        assert!(file_pattern_matches("README", "/p/README.md"));
        assert!(!file_pattern_matches("*.py", "src/main.rs"));
    }

    #[test]
    fn contains_any_is_case_insensitive() {
        assert!(contains_any("Cargo Build --release", &["build"]));
        assert!(!contains_any("cargo check", &["build", "test"]));
    }
}
