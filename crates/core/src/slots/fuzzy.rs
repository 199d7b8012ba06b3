//! Weighted fuzzy scoring of a query against a small candidate pool.
//!
//! Scores are on a 0–100 scale and combine a plain indel ratio, a sliding-window partial
//! ratio and token-set/token-sort ratios, weighted by how different the two lengths are.
//! That makes the score robust to word order and to a short name appearing inside a long
//! utterance, which is the common case when matching a whole sentence against a menu.
//! All lengths are counted in Unicode scalar values.

use std::collections::BTreeSet;

use rapidfuzz::distance::indel;

pub const DEFAULT_CONFIDENT_THRESHOLD: u8 = 80;
pub const DEFAULT_TENTATIVE_THRESHOLD: u8 = 60;

const UNBASE_SCALE: f64 = 0.95;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchThresholds {
    pub confident: u8,
    pub tentative: u8,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self { confident: DEFAULT_CONFIDENT_THRESHOLD, tentative: DEFAULT_TENTATIVE_THRESHOLD }
    }
}

impl MatchThresholds {
    pub fn tier(&self, score: f64) -> Option<MatchTier> {
        if score >= f64::from(self.confident) {
            Some(MatchTier::Confident)
        } else if score >= f64::from(self.tentative) {
            Some(MatchTier::Tentative)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchTier {
    Confident,
    Tentative,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FuzzyMatch<'a> {
    pub candidate: &'a str,
    pub score: f64,
    pub tier: MatchTier,
}

impl FuzzyMatch<'_> {
    pub fn is_confident(&self) -> bool {
        self.tier == MatchTier::Confident
    }
}

/// Best-scoring candidate of `pool`, or `None` when the pool is empty or the best score
/// falls below the tentative threshold.
///
/// Ties go to the candidate that appears first in `pool`.
pub fn best_match<'a>(
    query: &str,
    pool: &'a [String],
    thresholds: &MatchThresholds,
) -> Option<FuzzyMatch<'a>> {
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in pool {
        let score = weighted_ratio(query, candidate);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate.as_str(), score));
        }
    }

    let (candidate, score) = best?;
    let tier = thresholds.tier(score)?;
    Some(FuzzyMatch { candidate, score, tier })
}

pub fn weighted_ratio(s1: &str, s2: &str) -> f64 {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let longer = a.len().max(b.len()) as f64;
    let shorter = a.len().min(b.len()) as f64;
    let len_ratio = longer / shorter;

    let end_ratio = ratio_chars(&a, &b);
    if len_ratio < 1.5 {
        return end_ratio.max(token_ratio(s1, s2) * UNBASE_SCALE);
    }

    let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
    let end_ratio = end_ratio.max(partial_ratio_chars(&a, &b) * partial_scale);
    end_ratio.max(partial_token_ratio(s1, s2) * UNBASE_SCALE * partial_scale)
}

pub fn ratio(s1: &str, s2: &str) -> f64 {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    ratio_chars(&a, &b)
}

pub fn partial_ratio(s1: &str, s2: &str) -> f64 {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    partial_ratio_chars(&a, &b)
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    100.0 * indel::normalized_similarity(a.iter().copied(), b.iter().copied())
}

fn partial_ratio_chars(a: &[char], b: &[char]) -> f64 {
    let (needle, haystack) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if needle.is_empty() {
        return if haystack.is_empty() { 100.0 } else { 0.0 };
    }

    let mut best = best_window(needle, haystack);
    if best < 100.0 && needle.len() == haystack.len() {
        best = best.max(best_window(haystack, needle));
    }
    best
}

/// Slides `needle` over `haystack`, including the partial overlaps at both ends.
/// Windows whose boundary character does not occur in `needle` are skipped.
fn best_window(needle: &[char], haystack: &[char]) -> f64 {
    let needle_len = needle.len();
    let haystack_len = haystack.len();
    let mut best = 0.0f64;

    for end in 1..needle_len {
        if !needle.contains(&haystack[end - 1]) {
            continue;
        }
        best = best.max(ratio_chars(needle, &haystack[..end]));
        if best >= 100.0 {
            return best;
        }
    }

    for start in 0..(haystack_len - needle_len) {
        let window = &haystack[start..start + needle_len];
        if !needle.contains(&window[needle_len - 1]) {
            continue;
        }
        best = best.max(ratio_chars(needle, window));
        if best >= 100.0 {
            return best;
        }
    }

    for start in (haystack_len - needle_len)..haystack_len {
        if !needle.contains(&haystack[start]) {
            continue;
        }
        best = best.max(ratio_chars(needle, &haystack[start..]));
        if best >= 100.0 {
            return best;
        }
    }

    best
}

fn sorted_tokens(text: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

struct TokenSets<'a> {
    sorted_a: Vec<&'a str>,
    sorted_b: Vec<&'a str>,
    intersection: Vec<&'a str>,
    diff_ab: Vec<&'a str>,
    diff_ba: Vec<&'a str>,
}

impl<'a> TokenSets<'a> {
    fn split(s1: &'a str, s2: &'a str) -> Option<Self> {
        let sorted_a = sorted_tokens(s1);
        let sorted_b = sorted_tokens(s2);
        if sorted_a.is_empty() || sorted_b.is_empty() {
            return None;
        }

        let set_a: BTreeSet<&str> = sorted_a.iter().copied().collect();
        let set_b: BTreeSet<&str> = sorted_b.iter().copied().collect();
        Some(Self {
            intersection: set_a.intersection(&set_b).copied().collect(),
            diff_ab: set_a.difference(&set_b).copied().collect(),
            diff_ba: set_b.difference(&set_a).copied().collect(),
            sorted_a,
            sorted_b,
        })
    }
}

fn char_len(tokens: &[&str]) -> usize {
    let chars: usize = tokens.iter().map(|token| token.chars().count()).sum();
    chars + tokens.len().saturating_sub(1)
}

/// Maximum of the token-sort and token-set ratios.
fn token_ratio(s1: &str, s2: &str) -> f64 {
    let Some(sets) = TokenSets::split(s1, s2) else {
        return 0.0;
    };
    if !sets.intersection.is_empty() && (sets.diff_ab.is_empty() || sets.diff_ba.is_empty()) {
        return 100.0;
    }

    let mut result = ratio(&sets.sorted_a.join(" "), &sets.sorted_b.join(" "));

    let ab_len = char_len(&sets.diff_ab);
    let ba_len = char_len(&sets.diff_ba);
    if ab_len + ba_len > 0 {
        result = result.max(ratio(&sets.diff_ab.join(" "), &sets.diff_ba.join(" ")));
    }

    let sect_len = char_len(&sets.intersection);
    if sect_len == 0 {
        return result;
    }

    let with_intersection = |diff_len: usize| {
        let distance = 1 + diff_len;
        let lensum = sect_len + sect_len + 1 + diff_len;
        100.0 * (1.0 - distance as f64 / lensum as f64)
    };
    result.max(with_intersection(ab_len)).max(with_intersection(ba_len))
}

fn partial_token_ratio(s1: &str, s2: &str) -> f64 {
    let Some(sets) = TokenSets::split(s1, s2) else {
        return 0.0;
    };
    if !sets.intersection.is_empty() {
        return 100.0;
    }

    let result = partial_ratio(&sets.sorted_a.join(" "), &sets.sorted_b.join(" "));
    if sets.sorted_a.len() == sets.diff_ab.len() && sets.sorted_b.len() == sets.diff_ba.len() {
        return result;
    }
    result.max(partial_ratio(&sets.diff_ab.join(" "), &sets.diff_ba.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::{
        best_match, partial_ratio, ratio, weighted_ratio, MatchThresholds, MatchTier,
    };

    fn pool(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    #[test]
    fn identical_strings_score_full_marks() {
        assert_eq!(weighted_ratio("허니오트", "허니오트"), 100.0);
        assert_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(weighted_ratio("", "허니오트"), 0.0);
        assert_eq!(weighted_ratio("허니오트", ""), 0.0);
    }

    #[test]
    fn single_syllable_typo_lands_in_tentative_band() {
        assert_eq!(ratio("에그마오", "에그마요"), 75.0);
        assert_eq!(weighted_ratio("에그마오", "에그마요"), 75.0);
    }

    #[test]
    fn ratio_counts_unmatched_characters_on_both_sides() {
        let score = ratio("슈림프", "슈림프 라지");
        assert!((score - 200.0 / 3.0).abs() < 1e-9, "score was {score}");
        assert_eq!(ratio("햄", "참치"), 0.0);
    }

    #[test]
    fn word_order_does_not_matter() {
        assert_eq!(weighted_ratio("치킨 로스트", "로스트 치킨"), 95.0);
    }

    #[test]
    fn short_name_inside_long_sentence_is_scaled_down() {
        let sentence = "30cm 슈림프 빵 허니오트 치즈 아메리칸 양파 빼고 다";
        assert_eq!(partial_ratio("슈림프", sentence), 100.0);
        assert_eq!(weighted_ratio(sentence, "슈림프"), 60.0);
    }

    #[test]
    fn exact_name_in_medium_sentence_is_confident() {
        let score = weighted_ratio("허니오트 빵 주세요", "허니오트");
        assert!(score >= 80.0, "score was {score}");
    }

    #[test]
    fn best_match_prefers_first_of_equal_scores() {
        let candidates = pool(&["위트1", "위트2"]);
        let found = best_match("위트", &candidates, &MatchThresholds::default())
            .expect("both candidates score above threshold");
        assert_eq!(found.candidate, "위트1");
        assert_eq!(found.score, 90.0);
    }

    #[test]
    fn best_match_reports_tiers() {
        let candidates = pool(&["에그마요", "참치"]);
        let thresholds = MatchThresholds::default();

        let exact = best_match("에그마요", &candidates, &thresholds).expect("exact match");
        assert_eq!(exact.tier, MatchTier::Confident);
        assert!(exact.is_confident());

        let typo = best_match("에그마오", &candidates, &thresholds).expect("typo match");
        assert_eq!(typo.candidate, "에그마요");
        assert_eq!(typo.tier, MatchTier::Tentative);

        assert!(best_match("할라피뇨", &candidates, &thresholds).is_none());
    }

    #[test]
    fn empty_pool_never_matches() {
        assert!(best_match("햄", &[], &MatchThresholds::default()).is_none());
    }

    #[test]
    fn custom_thresholds_move_the_bands() {
        let strict = MatchThresholds { confident: 90, tentative: 76 };
        assert_eq!(strict.tier(89.9), Some(MatchTier::Tentative));
        assert_eq!(strict.tier(75.0), None);
        assert_eq!(strict.tier(90.0), Some(MatchTier::Confident));
    }
}
