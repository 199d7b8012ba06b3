use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::slot::SlotDraft;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

/// A draft the store is willing to accept. Construction re-checks the required slots
/// because the resolver's `missing` list is only advisory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderSubmission {
    slots: SlotDraft,
    summary: String,
}

impl OrderSubmission {
    pub fn new(slots: SlotDraft, summary: impl Into<String>) -> Result<Self, DomainError> {
        let missing = slots.missing_required();
        if !missing.is_empty() {
            return Err(DomainError::MissingRequiredSlots { missing });
        }
        Ok(Self { slots, summary: summary.into() })
    }

    pub fn slots(&self) -> &SlotDraft {
        &self.slots
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn into_parts(self) -> (SlotDraft, String) {
        (self.slots, self.summary)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub slots: SlotDraft,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}
