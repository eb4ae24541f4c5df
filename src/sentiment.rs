use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Words that count towards a positive headline. Matching is exact:
/// case- and diacritic-sensitive ("Up" and "uber" do not match).
pub const POSITIVE_WORDS: [&str; 6] = ["up", "rise", "good", "success", "high", "über"];

static LEXICON: Lazy<HashSet<&'static str>> = Lazy::new(|| POSITIVE_WORDS.into_iter().collect());

/// Minimum share of positive words (percent, inclusive).
pub const POSITIVE_THRESHOLD_PCT: usize = 50;

/// A headline is positive when at least half of its words are in the lexicon.
///
/// The ratio uses truncating integer arithmetic, so exactly 50% counts as
/// positive while 1 of 3 (33%) does not. Empty or all-whitespace input is
/// never positive.
pub fn is_positive(headline: &str) -> bool {
    let (positive, total) = score_headline(headline);
    if total == 0 {
        return false;
    }
    positive * 100 / total >= POSITIVE_THRESHOLD_PCT
}

/// Returns `(positive words, total words)`.
pub fn score_headline(headline: &str) -> (usize, usize) {
    tokenize(headline).fold((0, 0), |(pos, total), w| {
        (pos + usize::from(LEXICON.contains(w)), total + 1)
    })
}

/// Whitespace tokenizer shared with the reporter's headline signatures.
pub(crate) fn tokenize(s: &str) -> impl Iterator<Item = &str> + '_ {
    s.split_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_half_is_positive() {
        assert!(is_positive("success good low failure"));
        assert!(is_positive("up down"));
    }

    #[test]
    fn below_half_is_negative() {
        assert!(!is_positive("fall bad failure"));
        assert!(!is_positive("up down fall"));
    }

    #[test]
    fn blank_is_negative() {
        assert!(!is_positive(""));
        assert!(!is_positive("   \t "));
    }

    #[test]
    fn matching_is_case_and_diacritic_sensitive() {
        assert!(is_positive("über"));
        assert!(!is_positive("uber"));
        assert!(!is_positive("UP RISE"));
    }

    #[test]
    fn runs_of_whitespace_split_once() {
        assert_eq!(score_headline("up   rise\tlow"), (2, 3));
    }
}
