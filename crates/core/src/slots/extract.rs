use std::sync::LazyLock;

use regex::Regex;

use crate::domain::slot::Size;
use crate::slots::fuzzy::{best_match, FuzzyMatch, MatchThresholds};

pub const BREAD_KEYWORDS: &[&str] = &["빵", "브레드"];
pub const CHEESE_KEYWORDS: &[&str] = &["치즈"];

static LARGE_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:30|30cm|라지)\b").expect("large size pattern is valid"));

static REGULAR_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:15|15cm|레귤러)\b").expect("regular size pattern is valid")
});

/// Large wins when both sizes are mentioned.
pub fn extract_size(text: &str) -> Option<Size> {
    if LARGE_SIZE.is_match(text) {
        Some(Size::Large)
    } else if REGULAR_SIZE.is_match(text) {
        Some(Size::Regular)
    } else {
        None
    }
}

/// Matches the token right after the first keyword occurrence that is followed by one.
pub fn extract_by_keyword<'a>(
    text: &str,
    keywords: &[&str],
    pool: &'a [String],
    thresholds: &MatchThresholds,
) -> Option<FuzzyMatch<'a>> {
    let token = token_after_keyword(text, keywords)?;
    best_match(token, pool, thresholds)
}

/// Scores the whole utterance against the pool.
pub fn extract_global<'a>(
    text: &str,
    pool: &'a [String],
    thresholds: &MatchThresholds,
) -> Option<FuzzyMatch<'a>> {
    best_match(text, pool, thresholds)
}

fn is_token_char(ch: char) -> bool {
    !ch.is_whitespace() && ch != ',' && ch != '.'
}

fn token_after_keyword<'t>(text: &'t str, keywords: &[&str]) -> Option<&'t str> {
    let mut occurrences: Vec<(usize, usize)> = keywords
        .iter()
        .enumerate()
        .filter(|(_, keyword)| !keyword.is_empty())
        .flat_map(|(order, keyword)| {
            text.match_indices(*keyword).map(move |(start, _)| (start, order))
        })
        .collect();
    occurrences.sort_unstable();

    for (start, order) in occurrences {
        let after = &text[start + keywords[order].len()..];
        let rest = after.trim_start();
        let end = rest.find(|ch: char| !is_token_char(ch)).unwrap_or(rest.len());
        if end > 0 {
            return Some(&rest[..end]);
        }
    }
    None
}
