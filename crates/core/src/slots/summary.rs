use crate::domain::slot::SlotDraft;

const MISSING: &str = "-";
const DEFAULT_VEGETABLES: &str = "기본";
const NO_SAUCE: &str = "선택 안 함";
const NO_EXCLUSION: &str = "없음";

/// One-line order summary shown back to the customer.
pub fn summarize(draft: &SlotDraft) -> String {
    format!(
        "메인:{} / 사이즈:{} / 빵:{} / 치즈:{} / 야채:{} / 소스:{} / 빼기:{}",
        draft.main.as_deref().unwrap_or(MISSING),
        draft.size.map(|size| size.code()).unwrap_or(MISSING),
        draft.bread.as_deref().unwrap_or(MISSING),
        draft.cheese.as_deref().unwrap_or(MISSING),
        join_or(&draft.vegetables, DEFAULT_VEGETABLES),
        join_or(&draft.sauces, NO_SAUCE),
        join_or(&draft.exclude, NO_EXCLUSION),
    )
}

fn join_or(names: &[String], fallback: &str) -> String {
    if names.is_empty() {
        fallback.to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::slot::{Size, SlotDraft};

    use super::summarize;

    #[test]
    fn empty_draft_uses_placeholders() {
        assert_eq!(
            summarize(&SlotDraft::default()),
            "메인:- / 사이즈:- / 빵:- / 치즈:- / 야채:기본 / 소스:선택 안 함 / 빼기:없음"
        );
    }

    #[test]
    fn filled_draft_lists_values() {
        let draft = SlotDraft {
            main: Some("햄".to_string()),
            size: Some(Size::Regular),
            bread: Some("위트".to_string()),
            cheese: Some("슈레드".to_string()),
            vegetables: vec!["양상추".to_string(), "피클".to_string()],
            sauces: vec!["렌치".to_string()],
            exclude: vec!["양파".to_string()],
            ..SlotDraft::default()
        };

        assert_eq!(
            summarize(&draft),
            "메인:햄 / 사이즈:15 / 빵:위트 / 치즈:슈레드 / 야채:양상추, 피클 / 소스:렌치 / 빼기:양파"
        );
    }
}
