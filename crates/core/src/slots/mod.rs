//! Rule-based slot filling for a single utterance.
//!
//! The pipeline runs in a fixed order: normalize, pull out the size, fill bread and
//! cheese from the token after their keyword, fall back to whole-utterance fuzzy matching
//! for anything still empty, resolve the topping sets, promote tentative candidates and
//! finally report what is missing. Every stage is a plain function over the normalized
//! text so the stages can be tested on their own.

pub mod confidence;
pub mod extract;
pub mod fuzzy;
pub mod normalize;
pub mod sets;
pub mod summary;

use std::sync::Arc;

use crate::domain::slot::{SlotDraft, SlotName, SlotResult};
use crate::domain::vocabulary::Vocabulary;

use self::extract::{
    extract_by_keyword, extract_global, extract_size, BREAD_KEYWORDS, CHEESE_KEYWORDS,
};
use self::fuzzy::{MatchThresholds, MatchTier};

/// Stateless resolver over an immutable vocabulary. Cheap to clone and safe to share.
#[derive(Clone, Debug)]
pub struct SlotResolver {
    vocabulary: Arc<Vocabulary>,
    thresholds: MatchThresholds,
}

impl SlotResolver {
    pub fn new(vocabulary: Arc<Vocabulary>, thresholds: MatchThresholds) -> Self {
        Self { vocabulary, thresholds }
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    pub fn thresholds(&self) -> MatchThresholds {
        self.thresholds
    }

    pub fn resolve(&self, text: &str) -> SlotResult {
        let normalized = normalize::normalize(text);
        if normalized.is_empty() {
            return finish(SlotDraft::default(), text);
        }

        let mut draft = SlotDraft { size: extract_size(&normalized), ..SlotDraft::default() };

        let vocabulary = self.vocabulary.as_ref();
        draft.bread =
            extract_by_keyword(&normalized, BREAD_KEYWORDS, vocabulary.breads(), &self.thresholds)
                .map(|found| found.candidate.to_string());
        draft.cheese = extract_by_keyword(
            &normalized,
            CHEESE_KEYWORDS,
            vocabulary.cheeses(),
            &self.thresholds,
        )
        .map(|found| found.candidate.to_string());

        for slot in [SlotName::Main, SlotName::Bread, SlotName::Cheese] {
            self.fill_from_whole_text(&mut draft, slot, &normalized);
        }

        let toppings = sets::resolve_toppings(&normalized, text, vocabulary, &self.thresholds);
        draft.vegetables = toppings.vegetables;
        draft.sauces = toppings.sauces;
        draft.exclude = toppings.exclude;

        finish(draft, text)
    }

    fn fill_from_whole_text(&self, draft: &mut SlotDraft, slot: SlotName, normalized: &str) {
        if draft.is_filled(slot) {
            return;
        }

        let pool = match slot {
            SlotName::Main => self.vocabulary.mains(),
            SlotName::Bread => self.vocabulary.breads(),
            SlotName::Cheese => self.vocabulary.cheeses(),
            _ => return,
        };
        let Some(found) = extract_global(normalized, pool, &self.thresholds) else {
            return;
        };

        match found.tier {
            MatchTier::Confident => draft.fill_choice(slot, found.candidate),
            MatchTier::Tentative => draft.low_confidence.record(slot, found.candidate),
        }
    }
}

/// Promotes tentative candidates, then derives `missing` and the summary from the
/// promoted draft. Shared by every extraction strategy.
pub fn finish(mut draft: SlotDraft, raw_text: &str) -> SlotResult {
    confidence::promote_tentative(&mut draft, raw_text);
    let missing = draft.missing_required();
    let summary = summary::summarize(&draft);
    SlotResult { slots: draft, missing, summary }
}
