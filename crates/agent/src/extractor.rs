use async_trait::async_trait;
use kiosk_core::{SlotResolver, SlotResult};
use thiserror::Error;
use tracing::debug;

/// Per-request information handed to every extraction strategy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractionContext {
    pub correlation_id: String,
    /// Free-form caller hint, e.g. what the kiosk screen is currently asking for.
    pub hint: Option<String>,
}

impl ExtractionContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self { correlation_id: correlation_id.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("llm request failed: {0}")]
    Llm(String),
    #[error("llm response could not be used: {0}")]
    MalformedResponse(String),
}

impl ExtractionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Llm(_))
    }
}

/// Turns one utterance into a slot result.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(
        &self,
        text: &str,
        context: &ExtractionContext,
    ) -> Result<SlotResult, ExtractionError>;
}

/// Deterministic extraction over the menu vocabulary. Never fails.
#[derive(Clone, Debug)]
pub struct RuleBasedExtractor {
    resolver: SlotResolver,
}

impl RuleBasedExtractor {
    pub fn new(resolver: SlotResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &SlotResolver {
        &self.resolver
    }
}

#[async_trait]
impl Extractor for RuleBasedExtractor {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    async fn extract(
        &self,
        text: &str,
        context: &ExtractionContext,
    ) -> Result<SlotResult, ExtractionError> {
        let result = self.resolver.resolve(text);
        debug!(
            event_name = "extraction.rule_based.resolved",
            correlation_id = %context.correlation_id,
            missing = result.missing.len(),
            forced_main = result.slots.low_confidence.forced_main,
            "resolved utterance"
        );
        Ok(result)
    }
}
