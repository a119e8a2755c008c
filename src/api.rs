//! REST API for the budget assistant
//!
//! Chat with Finley, submit budget figures, and read back the normalized
//! monthly budget for a session.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::assistant::BudgetAssistant;
use crate::error::BudgetError;
use crate::intake::{apply_entries, BudgetEntry, IntakeReport};
use crate::memory::{ConversationMessage, MessageRole};
use crate::models::BudgetState;
use crate::money::{normalize_to_monthly, parse_money, Frequency, RawAmount};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct HistoryMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
}

#[derive(Debug, Deserialize)]
pub struct EntriesRequest {
    pub entries: Vec<BudgetEntry>,
}

#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    pub amount: Option<RawAmount>,
    #[serde(default)]
    pub frequency: Frequency,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NormalizeResponse {
    pub amount: Option<f64>,
    pub frequency: Frequency,
    pub monthly: Option<f64>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn failure(status: StatusCode, message: String) -> ApiResult {
    (status, Json(ApiResponse::error(message)))
}

fn status_for(error: &BudgetError) -> StatusCode {
    match error {
        BudgetError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        BudgetError::LlmError(_) | BudgetError::AuthError(_) | BudgetError::HttpError(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub assistant: Arc<BudgetAssistant>,
}

/// =============================
/// Session Ids
/// =============================

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

/// UUIDs are used as-is, any other non-empty string hashes to a stable id
pub fn session_id_from(value: Option<&str>) -> Uuid {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v)),
        _ => Uuid::new_v4(),
    }
}

/// =============================
/// Handlers
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> ApiResult {
    let session_id = session_id_from(req.session_id.as_deref());
    info!(session_id = %session_id, "Received chat message");

    // clients may replay user/agent turns only; the system prompt is ours
    let prior: Vec<ConversationMessage> = req
        .history
        .into_iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| ConversationMessage::new(m.role, m.content))
        .collect();

    if let Err(e) = state.assistant.seed_history(session_id, prior).await {
        error!("Failed to seed history: {}", e);
        return failure(status_for(&e), format!("Failed to load session: {}", e));
    }

    match state.assistant.handle_message(session_id, &req.message).await {
        Ok(reply) => (StatusCode::OK, Json(ApiResponse::success(reply))),
        Err(e) => {
            error!("Finley backend error: {}", e);
            failure(status_for(&e), format!("Failed to fetch response from model: {}", e))
        }
    }
}

async fn submit_entries(
    State(state): State<ApiState>,
    Path(session): Path<String>,
    Json(req): Json<EntriesRequest>,
) -> ApiResult {
    let session_id = session_id_from(Some(session.as_str()));
    let store = state.assistant.store();

    let mut report = IntakeReport::default();
    let entries = &req.entries;
    let updated = store
        .update(
            session_id,
            Box::new(|budget: &mut BudgetState| report = apply_entries(budget, entries)),
        )
        .await;

    let budget = match updated {
        Ok(budget) => budget,
        Err(e) => return failure(status_for(&e), format!("Failed to update session: {}", e)),
    };

    info!(
        session_id = %session_id,
        applied = report.applied.len(),
        rejected = report.rejected.len(),
        "Budget entries processed"
    );

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "session_id": session_id,
            "report": report,
            "budget": budget,
        }))),
    )
}

async fn get_budget(State(state): State<ApiState>, Path(session): Path<String>) -> ApiResult {
    let session_id = session_id_from(Some(session.as_str()));

    match state.assistant.store().load(session_id).await {
        Ok(Some(budget)) => (StatusCode::OK, Json(ApiResponse::success(budget))),
        Ok(None) => failure(StatusCode::NOT_FOUND, format!("Unknown session: {}", session)),
        Err(e) => failure(status_for(&e), format!("Failed to load session: {}", e)),
    }
}

async fn normalize(Json(req): Json<NormalizeRequest>) -> ApiResult {
    let amount = parse_money(req.amount.as_ref());
    let monthly = normalize_to_monthly(amount, &req.frequency);

    (
        StatusCode::OK,
        Json(ApiResponse::success(NormalizeResponse {
            amount,
            frequency: req.frequency,
            monthly,
        })),
    )
}

/// =============================
/// Router
/// =============================

pub fn create_router(assistant: Arc<BudgetAssistant>) -> Router {
    let state = ApiState { assistant };

    Router::new()
        .route("/health", get(health))
        .route("/api/finley", post(chat_handler))
        .route("/api/normalize", post(normalize))
        .route("/api/budget/:session", get(get_budget))
        .route("/api/budget/:session/entries", post(submit_entries))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    assistant: Arc<BudgetAssistant>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(assistant);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
