use std::fmt;

use serde::{Deserialize, Serialize};

/// The four slots an order cannot be saved without, in reporting order.
pub const REQUIRED_SLOTS: [SlotName; 4] =
    [SlotName::Main, SlotName::Size, SlotName::Bread, SlotName::Cheese];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    Main,
    Size,
    Bread,
    Cheese,
    Vegetables,
    Sauces,
    Exclude,
}

impl SlotName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Size => "size",
            Self::Bread => "bread",
            Self::Cheese => "cheese",
            Self::Vegetables => "vegetables",
            Self::Sauces => "sauces",
            Self::Exclude => "exclude",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    #[serde(rename = "15")]
    Regular,
    #[serde(rename = "30")]
    Large,
}

impl Size {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Regular => "15",
            Self::Large => "30",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Tentative candidates seen while resolving. They stay recorded after a promotion so
/// callers can tell which final values were not confident matches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowConfidence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bread: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cheese: Option<String>,
    /// Set when the tentative main was installed without corroboration.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub forced_main: bool,
}

impl LowConfidence {
    pub fn is_empty(&self) -> bool {
        self.main.is_none() && self.bread.is_none() && self.cheese.is_none() && !self.forced_main
    }

    pub fn get(&self, slot: SlotName) -> Option<&str> {
        match slot {
            SlotName::Main => self.main.as_deref(),
            SlotName::Bread => self.bread.as_deref(),
            SlotName::Cheese => self.cheese.as_deref(),
            _ => None,
        }
    }

    pub fn record(&mut self, slot: SlotName, candidate: impl Into<String>) {
        let candidate = Some(candidate.into());
        match slot {
            SlotName::Main => self.main = candidate,
            SlotName::Bread => self.bread = candidate,
            SlotName::Cheese => self.cheese = candidate,
            _ => {}
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDraft {
    pub main: Option<String>,
    pub size: Option<Size>,
    pub bread: Option<String>,
    pub cheese: Option<String>,
    #[serde(default, alias = "veggies")]
    pub vegetables: Vec<String>,
    #[serde(default)]
    pub sauces: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default, skip_serializing_if = "LowConfidence::is_empty")]
    pub low_confidence: LowConfidence,
    #[serde(default)]
    pub notes: String,
}

impl SlotDraft {
    pub fn is_filled(&self, slot: SlotName) -> bool {
        match slot {
            SlotName::Main => has_text(&self.main),
            SlotName::Size => self.size.is_some(),
            SlotName::Bread => has_text(&self.bread),
            SlotName::Cheese => has_text(&self.cheese),
            SlotName::Vegetables => !self.vegetables.is_empty(),
            SlotName::Sauces => !self.sauces.is_empty(),
            SlotName::Exclude => !self.exclude.is_empty(),
        }
    }

    /// Sets `main`, `bread` or `cheese`. Other slots are left untouched.
    pub fn fill_choice(&mut self, slot: SlotName, value: impl Into<String>) {
        let value = Some(value.into());
        match slot {
            SlotName::Main => self.main = value,
            SlotName::Bread => self.bread = value,
            SlotName::Cheese => self.cheese = value,
            _ => {}
        }
    }

    /// Required slots that are still absent, in `REQUIRED_SLOTS` order.
    pub fn missing_required(&self) -> Vec<SlotName> {
        REQUIRED_SLOTS.into_iter().filter(|slot| !self.is_filled(*slot)).collect()
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|text| !text.trim().is_empty())
}

/// What every extraction strategy hands back to its caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotResult {
    pub slots: SlotDraft,
    pub missing: Vec<SlotName>,
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{LowConfidence, Size, SlotDraft, SlotName};

    #[test]
    fn empty_draft_misses_every_required_slot() {
        assert_eq!(
            SlotDraft::default().missing_required(),
            vec![SlotName::Main, SlotName::Size, SlotName::Bread, SlotName::Cheese]
        );
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let draft = SlotDraft {
            main: Some("햄".to_string()),
            size: Some(Size::Large),
            low_confidence: LowConfidence {
                main: Some("햄".to_string()),
                forced_main: true,
                ..LowConfidence::default()
            },
            ..SlotDraft::default()
        };

        let value = serde_json::to_value(&draft).expect("serialize draft");
        assert_eq!(value["size"], json!("30"));
        assert_eq!(value["bread"], json!(null));
        assert_eq!(value["low_confidence"], json!({"main": "햄", "forced_main": true}));
        assert_eq!(value["notes"], json!(""));
    }

    #[test]
    fn low_confidence_is_omitted_when_empty() {
        let value = serde_json::to_value(SlotDraft::default()).expect("serialize draft");
        assert!(value.get("low_confidence").is_none());
    }

    #[test]
    fn blank_choices_count_as_missing() {
        let draft: SlotDraft = serde_json::from_value(json!({
            "main": "  ",
            "size": "15",
            "bread": "위트",
            "veggies": ["양파"]
        }))
        .expect("parse client draft");

        assert_eq!(draft.vegetables, vec!["양파".to_string()]);
        assert_eq!(draft.missing_required(), vec![SlotName::Main, SlotName::Cheese]);
    }

    #[test]
    fn size_parses_from_code() {
        let size: Size = serde_json::from_value(json!("15")).expect("parse size");
        assert_eq!(size, Size::Regular);
        assert_eq!(Size::Large.to_string(), "30");
    }
}
