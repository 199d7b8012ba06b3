//! Order-taking HTTP API.
//!
//! - `POST /parse`        parse one utterance
//! - `POST /infer`        transcribe an uploaded recording (`file` field) and parse it
//! - `POST /save`         store a complete order
//! - `GET  /orders`       recent orders, newest first (`?limit=`, default 20)
//! - `GET  /orders/{id}`  one stored order

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use kiosk_agent::{
    AudioClip, ExtractionContext, ExtractionError, OrderRuntime, RuntimeError, TranscriptionError,
};
use kiosk_core::{
    ApplicationError, InterfaceError, OrderId, OrderRecord, OrderSubmission, SlotDraft,
    SlotResult,
};
use kiosk_db::{OrderRepository, RepositoryError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_LIST_LIMIT: u32 = 20;
const MAX_LIST_LIMIT: u32 = 200;
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;
const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct ApiState {
    pub runtime: Arc<OrderRuntime>,
    pub orders: Arc<dyn OrderRepository>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/parse", post(parse_order))
        .route("/infer", post(infer_order).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)))
        .route("/save", post(save_order))
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(order_detail))
        .with_state(state)
}

/// JSON error body `{ok: false, error}` carrying the correlation id as a header.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl From<InterfaceError> for ApiError {
    fn from(value: InterfaceError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
            InterfaceError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, self.0.user_message().to_string())
            }
            InterfaceError::ServiceUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, self.0.user_message().to_string())
            }
            InterfaceError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.user_message().to_string())
            }
        };

        let mut response = (status, Json(ErrorBody { ok: false, error })).into_response();
        if let Ok(value) = HeaderValue::from_str(self.0.correlation_id()) {
            response.headers_mut().insert(CORRELATION_HEADER, value);
        }
        response
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub text: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub text: String,
    #[serde(flatten)]
    pub result: SlotResult,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub slots: SlotDraft,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub ok: bool,
    pub order_id: OrderId,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub summary: String,
    pub slots: SlotDraft,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OrderList {
    pub ok: bool,
    pub items: Vec<OrderSummary>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub ok: bool,
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub slots: SlotDraft,
    pub summary: String,
}

async fn parse_order(
    State(state): State<ApiState>,
    Json(request): Json<ParseRequest>,
) -> Result<Json<ParseResponse>, ApiError> {
    let context = extraction_context(request.context);
    let result = state
        .runtime
        .handle_text(&request.text, &context)
        .await
        .map_err(|error| extraction_failure(error, &context.correlation_id))?;

    Ok(Json(ParseResponse { text: request.text, result }))
}

async fn infer_order(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<Json<ParseResponse>, ApiError> {
    let context = extraction_context(None);
    let correlation_id = context.correlation_id.clone();
    let bad_request = |message: String| InterfaceError::BadRequest {
        message,
        correlation_id: correlation_id.clone(),
    };

    let mut clip = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| bad_request(format!("invalid multipart body: {error}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().unwrap_or("audio/webm").to_string();
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|error| bad_request(format!("could not read upload: {error}")))?;
        clip = Some(AudioClip { bytes: bytes.to_vec(), content_type, filename });
        break;
    }
    let clip = clip.ok_or_else(|| bad_request("multipart field `file` is required".to_string()))?;

    let heard = state.runtime.handle_audio(&clip, &context).await.map_err(|error| match error {
        RuntimeError::Transcription(error) => transcription_failure(error, &correlation_id),
        RuntimeError::Extraction(error) => extraction_failure(error, &correlation_id),
    })?;

    Ok(Json(ParseResponse { text: heard.text, result: heard.result }))
}

async fn save_order(
    State(state): State<ApiState>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, ApiError> {
    let correlation_id = new_correlation_id();
    let submission = OrderSubmission::new(request.slots, request.summary)
        .map_err(|error| ApplicationError::from(error).into_interface(&correlation_id))?;

    let order_id = state
        .orders
        .create(submission)
        .await
        .map_err(|error| persistence_failure(error, &correlation_id))?;

    info!(
        event_name = "order.saved",
        correlation_id = %correlation_id,
        order_id = order_id.0,
        "order stored"
    );
    Ok(Json(SaveResponse { ok: true, order_id }))
}

async fn list_orders(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<OrderList>, ApiError> {
    let correlation_id = new_correlation_id();
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let records = state
        .orders
        .list_recent(limit)
        .await
        .map_err(|error| persistence_failure(error, &correlation_id))?;

    let items = records
        .into_iter()
        .map(|record| OrderSummary {
            id: record.id,
            summary: record.summary,
            slots: record.slots,
            created_at: record.created_at,
        })
        .collect();
    Ok(Json(OrderList { ok: true, items }))
}

async fn order_detail(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<OrderDetail>, ApiError> {
    let correlation_id = new_correlation_id();
    let record: Option<OrderRecord> = state
        .orders
        .find_by_id(OrderId(id))
        .await
        .map_err(|error| persistence_failure(error, &correlation_id))?;

    let record = record.ok_or_else(|| {
        ApplicationError::NotFound(format!("order {id}")).into_interface(&correlation_id)
    })?;

    Ok(Json(OrderDetail {
        ok: true,
        id: record.id,
        created_at: record.created_at,
        slots: record.slots,
        summary: record.summary,
    }))
}

fn new_correlation_id() -> String {
    format!("req-{}", Uuid::new_v4())
}

fn extraction_context(hint: Option<String>) -> ExtractionContext {
    let context = ExtractionContext::new(new_correlation_id());
    match hint.filter(|hint| !hint.trim().is_empty()) {
        Some(hint) => context.with_hint(hint),
        None => context,
    }
}

fn extraction_failure(error: ExtractionError, correlation_id: &str) -> InterfaceError {
    warn!(
        event_name = "order.extraction_failed",
        correlation_id = %correlation_id,
        retryable = error.is_retryable(),
        error = %error,
        "extraction failed"
    );
    ApplicationError::Integration(error.to_string()).into_interface(correlation_id)
}

fn transcription_failure(error: TranscriptionError, correlation_id: &str) -> InterfaceError {
    if error.is_client_error() {
        return InterfaceError::BadRequest {
            message: error.to_string(),
            correlation_id: correlation_id.to_string(),
        };
    }
    ApplicationError::Integration(error.to_string()).into_interface(correlation_id)
}

fn persistence_failure(error: RepositoryError, correlation_id: &str) -> InterfaceError {
    warn!(
        event_name = "order.store_failed",
        correlation_id = %correlation_id,
        error = %error,
        "order store failed"
    );
    ApplicationError::Persistence(error.to_string()).into_interface(correlation_id)
}
