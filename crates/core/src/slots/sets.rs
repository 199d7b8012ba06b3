use std::sync::LazyLock;

use regex::Regex;

use crate::domain::vocabulary::Vocabulary;
use crate::slots::fuzzy::{best_match, MatchThresholds};

static EXCLUSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\S+)\s*빼고\s*(?:다|전부)").expect("exclusion pattern is valid")
});

static ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S+)\s*만").expect("only pattern is valid"));

static ALL_VEGETABLES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"야채.*(?:다|전부)").expect("all-vegetables pattern is valid"));

static ALL_SAUCES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"소스.*(?:다|전부)").expect("all-sauces pattern is valid"));

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Toppings {
    pub vegetables: Vec<String>,
    pub sauces: Vec<String>,
    pub exclude: Vec<String>,
}

/// Resolves the vegetable and sauce sets of a normalized utterance.
///
/// Order of precedence: exclusions are collected first and suppress literal hits, an
/// "only X" phrase replaces whatever its category found, and exclusions are subtracted
/// from the final sets. Vegetables fall back to the full list unless the speaker used
/// "only" for either category.
///
/// Literal mentions are also looked up in `raw`, since particle stripping can clip a menu
/// name (`오이` normalizes to `오`).
pub fn resolve_toppings(
    text: &str,
    raw: &str,
    vocabulary: &Vocabulary,
    thresholds: &MatchThresholds,
) -> Toppings {
    let pool = vocabulary.toppings();

    let mut exclude: Vec<String> = Vec::new();
    for captures in EXCLUSION.captures_iter(text) {
        let name = resolve_item(&captures[1], &pool, thresholds);
        if !exclude.contains(&name) {
            exclude.push(name);
        }
    }

    let mut only_vegetable = None;
    let mut only_sauce = None;
    for captures in ONLY.captures_iter(text) {
        let name = resolve_item(&captures[1], &pool, thresholds);
        if vocabulary.is_vegetable(&name) {
            only_vegetable = Some(name.clone());
        }
        if vocabulary.is_sauce(&name) {
            only_sauce = Some(name);
        }
    }

    let raw = raw.to_lowercase();
    let mentioned = |names: &[String]| -> Vec<String> {
        names
            .iter()
            .filter(|name| {
                (text.contains(name.as_str()) || raw.contains(name.as_str()))
                    && !exclude.contains(name)
            })
            .cloned()
            .collect()
    };
    let mut vegetables = mentioned(vocabulary.vegetables());
    let mut sauces = mentioned(vocabulary.sauces());

    if vegetables.is_empty() && ALL_VEGETABLES.is_match(text) {
        vegetables = vocabulary.vegetables().to_vec();
    }
    if sauces.is_empty() && ALL_SAUCES.is_match(text) {
        sauces = vocabulary.sauces().to_vec();
    }

    let only_fired = only_vegetable.is_some() || only_sauce.is_some();
    if let Some(name) = only_vegetable {
        vegetables = vec![name];
    }
    if let Some(name) = only_sauce {
        sauces = vec![name];
    }
    if vegetables.is_empty() && !only_fired {
        vegetables = vocabulary.vegetables().to_vec();
    }

    vegetables.retain(|name| !exclude.contains(name));
    sauces.retain(|name| !exclude.contains(name));

    Toppings { vegetables, sauces, exclude }
}

/// Canonical topping name for `item`, or `item` itself when nothing in the pool is close.
fn resolve_item(item: &str, pool: &[String], thresholds: &MatchThresholds) -> String {
    best_match(item, pool, thresholds)
        .map(|found| found.candidate.to_string())
        .unwrap_or_else(|| item.to_string())
}

#[cfg(test)]
mod tests {
    use crate::domain::vocabulary::Vocabulary;
    use crate::slots::fuzzy::MatchThresholds;

    use super::{resolve_toppings, Toppings};

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    fn resolve(text: &str) -> Toppings {
        resolve_toppings(text, text, &Vocabulary::kiosk_default(), &MatchThresholds::default())
    }

    #[test]
    fn exclusion_removes_item_from_default_vegetables() {
        let toppings = resolve("양파 빼고 다");
        assert_eq!(toppings.exclude, names(&["양파"]));
        assert_eq!(
            toppings.vegetables,
            names(&["양상추", "토마토", "오이", "피망", "피클", "올리브", "할라피뇨"])
        );
        assert!(toppings.sauces.is_empty());
    }

    #[test]
    fn unknown_excluded_item_is_kept_verbatim() {
        let toppings = resolve("고수 빼고 전부");
        assert_eq!(toppings.exclude, names(&["고수"]));
        assert_eq!(toppings.vegetables.len(), Vocabulary::kiosk_default().vegetables().len());
    }

    #[test]
    fn literal_mentions_are_kept_in_menu_order() {
        let toppings = resolve("피클 토마토 소스 마요네즈 렌치");
        assert_eq!(toppings.vegetables, names(&["토마토", "피클"]));
        assert_eq!(toppings.sauces, names(&["렌치", "마요네즈"]));
    }

    #[test]
    fn names_clipped_by_normalization_are_found_in_raw_text() {
        let toppings = resolve_toppings(
            "오 피클 넣어주세요",
            "오이 피클 넣어주세요",
            &Vocabulary::kiosk_default(),
            &MatchThresholds::default(),
        );
        assert_eq!(toppings.vegetables, names(&["오이", "피클"]));
    }

    #[test]
    fn only_sauce_leaves_vegetables_empty() {
        let toppings = resolve("렌치만");
        assert_eq!(toppings.sauces, names(&["렌치"]));
        assert!(toppings.vegetables.is_empty());
        assert!(toppings.exclude.is_empty());
    }

    #[test]
    fn only_overrides_literal_mentions() {
        let toppings = resolve("양파만 토마토 피클");
        assert_eq!(toppings.vegetables, names(&["양파"]));
        assert!(toppings.sauces.is_empty());
    }

    #[test]
    fn all_phrases_expand_to_full_lists() {
        let vocabulary = Vocabulary::kiosk_default();
        let toppings = resolve("야채 다 소스 전부");
        assert_eq!(toppings.vegetables, vocabulary.vegetables().to_vec());
        assert_eq!(toppings.sauces, vocabulary.sauces().to_vec());
    }

    #[test]
    fn exclusions_never_overlap_final_sets() {
        let utterances =
            ["양파 빼고 다", "렌치 빼고 다 소스 전부", "피클만 피클 빼고 다", "할라피뇨 빼고 다 야채 다"];
        for text in utterances {
            let toppings = resolve(text);
            for name in &toppings.exclude {
                assert!(!toppings.vegetables.contains(name), "`{text}` kept vegetable {name}");
                assert!(!toppings.sauces.contains(name), "`{text}` kept sauce {name}");
            }
        }
    }
}
