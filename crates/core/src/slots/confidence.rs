use crate::domain::slot::{SlotDraft, SlotName};

const CATEGORY_CUES: [(SlotName, &str); 2] = [(SlotName::Bread, "빵"), (SlotName::Cheese, "치즈")];

/// Fills empty required slots from their tentative candidates.
///
/// A tentative main is always installed and flagged as forced. Bread and cheese are only
/// installed when the raw utterance names the category.
pub fn promote_tentative(draft: &mut SlotDraft, raw_text: &str) {
    if draft.main.is_none() {
        if let Some(candidate) = draft.low_confidence.get(SlotName::Main).map(str::to_string) {
            draft.fill_choice(SlotName::Main, candidate);
            draft.low_confidence.forced_main = true;
        }
    }

    for (slot, cue) in CATEGORY_CUES {
        if draft.is_filled(slot) || !raw_text.contains(cue) {
            continue;
        }
        if let Some(candidate) = draft.low_confidence.get(slot).map(str::to_string) {
            draft.fill_choice(slot, candidate);
        }
    }
}
