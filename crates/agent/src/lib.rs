//! Order agent - turns kiosk utterances and recordings into slot results
//!
//! This crate sits between the HTTP surface and the pure slot engine in `kiosk-core`:
//! - Defines the `Extractor` capability shared by every extraction strategy
//! - Wraps the rule-based resolver as the default strategy
//! - Offers a hosted-LLM strategy whose answers are grounded on the menu vocabulary
//! - Talks to a Whisper-compatible speech-to-text endpoint
//!
//! # Key Types
//!
//! - `OrderRuntime` - runs one text or audio turn (see `runtime` module)
//! - `LlmClient` - pluggable chat-completion transport
//! - `Transcriber` - pluggable speech-to-text transport
//!
//! # Grounding Principle
//!
//! The LLM is strictly a reader. Every value it proposes is snapped onto the closed menu
//! vocabulary before it can fill a slot.

pub mod extractor;
pub mod llm;
pub mod runtime;
pub mod transcribe;

pub use extractor::{ExtractionContext, ExtractionError, Extractor, RuleBasedExtractor};
pub use llm::{LlmClient, LlmExtractor, OpenAiCompatibleClient};
pub use runtime::{HeardOrder, OrderRuntime, RuntimeError};
pub use transcribe::{
    AudioClip, DisabledTranscriber, Transcriber, TranscriptionError, WhisperTranscriber,
};
