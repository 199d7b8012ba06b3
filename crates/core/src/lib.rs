//! Core of the kiosk ordering workspace.
//!
//! Holds the closed menu vocabulary, the slot draft model and the rule-based slot
//! engine that turns one utterance into a structured order draft. Everything here is
//! synchronous and free of I/O apart from loading configuration files.

pub mod config;
pub mod domain;
pub mod errors;
pub mod slots;

pub use domain::order::{OrderId, OrderRecord, OrderSubmission};
pub use domain::slot::{LowConfidence, Size, SlotDraft, SlotName, SlotResult};
pub use domain::vocabulary::{Vocabulary, VocabularyError};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use slots::fuzzy::{FuzzyMatch, MatchThresholds, MatchTier};
pub use slots::SlotResolver;
