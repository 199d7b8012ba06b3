//! Hosted-LLM extraction.
//!
//! The model is only asked to read the utterance. Whatever it answers is snapped back
//! onto the menu vocabulary with the same fuzzy matcher the rule-based path uses, and the
//! same promotion, missing-field and summary stages run afterwards, so a hallucinated
//! name can never reach a slot.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use kiosk_core::config::LlmConfig;
use kiosk_core::slots::extract::extract_size;
use kiosk_core::slots::fuzzy::best_match;
use kiosk_core::slots::{finish, normalize::normalize};
use kiosk_core::{MatchThresholds, SlotDraft, SlotName, SlotResolver, SlotResult, Vocabulary};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::extractor::{ExtractionContext, ExtractionError, Extractor};

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

const SYSTEM_PROMPT: &str =
    "You read sandwich kiosk orders spoken in Korean and answer with a single JSON object.";
const RETRY_BACKOFF_MS: u64 = 250;
/// Below this self-reported confidence every scalar answer is treated as tentative.
const LOW_MODEL_CONFIDENCE: f64 = 0.5;

/// Client for any endpoint that speaks the OpenAI chat-completions protocol
/// (OpenAI itself, Ollama's compatibility layer).
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    max_retries: u32,
}

struct AttemptFailure {
    error: anyhow::Error,
    retryable: bool,
}

impl OpenAiCompatibleClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build llm http client")?;

        Ok(Self {
            http,
            endpoint: format!("{}/v1/chat/completions", config.endpoint_base()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_once(&self, body: &Value) -> Result<String, AttemptFailure> {
        let mut request = self.http.post(&self.endpoint).json(body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| AttemptFailure {
            error: anyhow!("chat completion request failed: {error}"),
            retryable: true,
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|error| AttemptFailure {
            error: anyhow!("chat completion body could not be read: {error}"),
            retryable: true,
        })?;

        if !status.is_success() {
            return Err(AttemptFailure {
                error: anyhow!("chat completion endpoint returned {status}: {text}"),
                retryable: status.is_server_error(),
            });
        }

        parse_completion(&text).map_err(|error| AttemptFailure { error, retryable: false })
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": &self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.1
        });

        let mut attempt = 0u32;
        loop {
            match self.send_once(&body).await {
                Ok(content) => return Ok(content),
                Err(failure) if failure.retryable && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        event_name = "llm.request.retry",
                        attempt,
                        error = %failure.error,
                        "retrying chat completion"
                    );
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt)))
                        .await;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }
}

fn parse_completion(body: &str) -> Result<String> {
    #[derive(Deserialize)]
    struct Message {
        content: Option<String>,
    }
    #[derive(Deserialize)]
    struct Choice {
        message: Message,
    }
    #[derive(Deserialize)]
    struct ApiResponse {
        choices: Vec<Choice>,
    }

    let parsed: ApiResponse =
        serde_json::from_str(body).context("chat completion response is not valid json")?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("chat completion returned no content"))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderIntent {
    QuickOrder,
    CustomOrder,
    Modify,
    InfoQuery,
    Confirm,
    Cancel,
    ViewCart,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, Deserialize)]
struct LlmAnswer {
    intent: Option<OrderIntent>,
    #[serde(default)]
    slots: LlmSlots,
    confidence: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmSlots {
    main: Option<String>,
    size: Option<Value>,
    bread: Option<String>,
    cheese: Option<String>,
    #[serde(default)]
    vegetables: Vec<String>,
    #[serde(default)]
    sauces: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

/// Extraction strategy that asks a hosted model first and then grounds its answer.
pub struct LlmExtractor {
    client: Arc<dyn LlmClient>,
    resolver: SlotResolver,
}

impl LlmExtractor {
    pub fn new(client: Arc<dyn LlmClient>, resolver: SlotResolver) -> Self {
        Self { client, resolver }
    }

    fn ground(&self, answer: LlmAnswer) -> SlotDraft {
        let vocabulary = self.resolver.vocabulary().as_ref();
        let thresholds = self.resolver.thresholds();
        let trusted = answer.confidence.map_or(true, |value| value >= LOW_MODEL_CONFIDENCE);
        let slots = answer.slots;

        let mut draft = SlotDraft {
            size: slots.size.as_ref().and_then(size_from_value),
            ..SlotDraft::default()
        };

        let choices = [
            (SlotName::Main, slots.main.as_deref(), vocabulary.mains()),
            (SlotName::Bread, slots.bread.as_deref(), vocabulary.breads()),
            (SlotName::Cheese, slots.cheese.as_deref(), vocabulary.cheeses()),
        ];
        for (slot, value, pool) in choices {
            let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
                continue;
            };
            let Some(found) = best_match(value, pool, &thresholds) else {
                continue;
            };
            if trusted && found.is_confident() {
                draft.fill_choice(slot, found.candidate);
            } else {
                draft.low_confidence.record(slot, found.candidate);
            }
        }

        draft.exclude = ground_exclusions(&slots.exclude, vocabulary, &thresholds);
        draft.vegetables = ground_set(&slots.vegetables, vocabulary.vegetables(), &thresholds);
        draft.sauces = ground_set(&slots.sauces, vocabulary.sauces(), &thresholds);
        draft.vegetables.retain(|name| !draft.exclude.contains(name));
        draft.sauces.retain(|name| !draft.exclude.contains(name));

        draft
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn extract(
        &self,
        text: &str,
        context: &ExtractionContext,
    ) -> Result<SlotResult, ExtractionError> {
        if text.trim().is_empty() {
            return Ok(finish(SlotDraft::default(), text));
        }

        let prompt = build_prompt(self.resolver.vocabulary(), text, context);
        let raw = self
            .client
            .complete(&prompt)
            .await
            .map_err(|error| ExtractionError::Llm(format!("{error:#}")))?;
        let answer = parse_answer(&raw)?;

        info!(
            event_name = "extraction.llm.answered",
            correlation_id = %context.correlation_id,
            intent = ?answer.intent,
            confidence = answer.confidence,
            "llm answered"
        );

        Ok(finish(self.ground(answer), text))
    }
}

pub fn build_prompt(vocabulary: &Vocabulary, text: &str, context: &ExtractionContext) -> String {
    let hint = context.hint.as_deref().unwrap_or("none");
    format!(
        "MENU ({count} names)\n\
         MAINS: {mains}\n\
         BREADS: {breads}\n\
         CHEESES: {cheeses}\n\
         VEGETABLES: {vegetables}\n\
         SAUCES: {sauces}\n\
         \n\
         CONTEXT: {hint}\n\
         \n\
         Answer with JSON only:\n\
         {{\"intent\": \"quick_order|custom_order|modify|info_query|confirm|cancel|view_cart\", \
         \"slots\": {{\"main\": string|null, \"size\": \"15\"|\"30\"|null, \"bread\": string|null, \
         \"cheese\": string|null, \"vegetables\": [string], \"sauces\": [string], \
         \"exclude\": [string]}}, \"confidence\": number between 0 and 1}}\n\
         Use only names from the menu. \"빼고\" means the item goes into exclude.\n\
         \n\
         UTTERANCE: {text}",
        count = vocabulary.len(),
        mains = vocabulary.mains().join(", "),
        breads = vocabulary.breads().join(", "),
        cheeses = vocabulary.cheeses().join(", "),
        vegetables = vocabulary.vegetables().join(", "),
        sauces = vocabulary.sauces().join(", "),
    )
}

fn parse_answer(raw: &str) -> Result<LlmAnswer, ExtractionError> {
    let block = json_block(raw).ok_or_else(|| {
        ExtractionError::MalformedResponse("no json object in llm answer".to_string())
    })?;
    serde_json::from_str(block)
        .map_err(|error| ExtractionError::MalformedResponse(format!("invalid answer json: {error}")))
}

/// The JSON object inside a fenced block, or the outermost braces of a bare answer.
fn json_block(raw: &str) -> Option<&str> {
    if let Some(start) = raw.find("```") {
        let after_fence = &raw[start + 3..];
        let body_start = after_fence.find('\n').map_or(0, |index| index + 1);
        let body = &after_fence[body_start..];
        if let Some(end) = body.find("```") {
            return Some(body[..end].trim());
        }
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

fn size_from_value(value: &Value) -> Option<kiosk_core::Size> {
    let raw = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    extract_size(&normalize(&raw))
}

fn ground_set(values: &[String], pool: &[String], thresholds: &MatchThresholds) -> Vec<String> {
    let hits: Vec<&str> = values
        .iter()
        .filter_map(|value| best_match(value.trim(), pool, thresholds))
        .map(|found| found.candidate)
        .collect();
    pool.iter().filter(|name| hits.contains(&name.as_str())).cloned().collect()
}

fn ground_exclusions(
    values: &[String],
    vocabulary: &Vocabulary,
    thresholds: &MatchThresholds,
) -> Vec<String> {
    let pool = vocabulary.toppings();
    let mut exclude = Vec::new();
    for value in values.iter().map(|value| value.trim()).filter(|value| !value.is_empty()) {
        let name = best_match(value, &pool, thresholds)
            .map(|found| found.candidate.to_string())
            .unwrap_or_else(|| value.to_string());
        if !exclude.contains(&name) {
            exclude.push(name);
        }
    }
    exclude
}
