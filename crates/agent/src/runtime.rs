use std::sync::Arc;

use kiosk_core::SlotResult;
use thiserror::Error;
use tracing::{info, warn};

use crate::extractor::{ExtractionContext, ExtractionError, Extractor};
use crate::transcribe::{AudioClip, Transcriber, TranscriptionError};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Result of an audio turn: what was heard and what it resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeardOrder {
    pub text: String,
    pub result: SlotResult,
}

pub struct OrderRuntime {
    extractor: Arc<dyn Extractor>,
    transcriber: Arc<dyn Transcriber>,
}

impl OrderRuntime {
    pub fn new(extractor: Arc<dyn Extractor>, transcriber: Arc<dyn Transcriber>) -> Self {
        Self { extractor, transcriber }
    }

    pub fn strategy(&self) -> &'static str {
        self.extractor.name()
    }

    pub async fn handle_text(
        &self,
        text: &str,
        context: &ExtractionContext,
    ) -> Result<SlotResult, ExtractionError> {
        let result = self.extractor.extract(text, context).await?;
        info!(
            event_name = "order.parsed",
            correlation_id = %context.correlation_id,
            strategy = self.extractor.name(),
            missing = result.missing.len(),
            "utterance parsed"
        );
        Ok(result)
    }

    /// Transcribes `clip` and parses the transcript. Extraction is skipped when
    /// transcription fails.
    pub async fn handle_audio(
        &self,
        clip: &AudioClip,
        context: &ExtractionContext,
    ) -> Result<HeardOrder, RuntimeError> {
        let text = match self.transcriber.transcribe(clip).await {
            Ok(text) => text,
            Err(error) => {
                warn!(
                    event_name = "order.transcription_failed",
                    correlation_id = %context.correlation_id,
                    retryable = error.is_retryable(),
                    error = %error,
                    "transcription failed"
                );
                return Err(error.into());
            }
        };

        let result = self.handle_text(&text, context).await?;
        Ok(HeardOrder { text, result })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use kiosk_core::{MatchThresholds, SlotResolver, SlotResult, Vocabulary};

    use super::{OrderRuntime, RuntimeError};
    use crate::extractor::{ExtractionContext, ExtractionError, Extractor, RuleBasedExtractor};
    use crate::transcribe::{AudioClip, DisabledTranscriber, Transcriber, TranscriptionError};

    struct FixedTranscriber(&'static str);

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        async fn transcribe(&self, _clip: &AudioClip) -> Result<String, TranscriptionError> {
            Ok(self.0.to_string())
        }
    }

    struct CountingExtractor {
        inner: RuleBasedExtractor,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Extractor for CountingExtractor {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn extract(
            &self,
            text: &str,
            context: &ExtractionContext,
        ) -> Result<SlotResult, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.extract(text, context).await
        }
    }

    fn counting_extractor() -> Arc<CountingExtractor> {
        Arc::new(CountingExtractor {
            inner: RuleBasedExtractor::new(SlotResolver::new(
                Arc::new(Vocabulary::kiosk_default()),
                MatchThresholds::default(),
            )),
            calls: AtomicUsize::new(0),
        })
    }

    fn webm() -> AudioClip {
        AudioClip { bytes: vec![1, 2, 3], content_type: "audio/webm".to_string(), filename: None }
    }

    #[tokio::test]
    async fn audio_turn_parses_transcript() {
        let extractor = counting_extractor();
        let runtime =
            OrderRuntime::new(extractor.clone(), Arc::new(FixedTranscriber("렌치만")));

        let heard = runtime
            .handle_audio(&webm(), &ExtractionContext::new("req-1"))
            .await
            .expect("audio turn");

        assert_eq!(heard.text, "렌치만");
        assert_eq!(heard.result.slots.sauces, vec!["렌치".to_string()]);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_transcription_skips_extraction() {
        let extractor = counting_extractor();
        let runtime = OrderRuntime::new(extractor.clone(), Arc::new(DisabledTranscriber));

        let error = runtime
            .handle_audio(&webm(), &ExtractionContext::new("req-2"))
            .await
            .expect_err("disabled transcriber");

        assert!(matches!(error, RuntimeError::Transcription(TranscriptionError::Disabled)));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn text_turn_reports_strategy() {
        let runtime = OrderRuntime::new(counting_extractor(), Arc::new(DisabledTranscriber));
        assert_eq!(runtime.strategy(), "counting");

        let result = runtime
            .handle_text("에그마오", &ExtractionContext::new("req-3"))
            .await
            .expect("text turn");
        assert_eq!(result.slots.main.as_deref(), Some("에그마요"));
    }
}
