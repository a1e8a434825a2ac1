//! REST API Server for IntelliChat
//!
//! Exposes the dialog orchestrator over HTTP. Each request carries a session
//! id; turns for the same session are serialized by the session lock.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::dialog::DialogOrchestrator;
use crate::session::SessionStore;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub session_id: Uuid,
    pub response: String,
    pub awaiting_confirmation: bool,
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

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<DialogOrchestrator>,
    pub sessions: SessionStore,
}

/// =============================
/// Helpers
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

/// Accept a UUID or any opaque client label; absent ids start a new session.
fn session_id_from(value: Option<&str>) -> Uuid {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v)),
        _ => Uuid::new_v4(),
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let message = req.message.trim();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Message must not be empty".into())),
        );
    }

    let session_id = session_id_from(req.session_id.as_deref());
    info!(session_id = %session_id, "Chat message received");

    let session = state.sessions.get_or_create(session_id).await;
    let mut session = session.lock().await;
    let reply = state.orchestrator.handle_message(&mut session, message).await;

    (
        StatusCode::OK,
        Json(ApiResponse::success(ChatReply {
            session_id,
            response: reply.response_text,
            awaiting_confirmation: reply.awaiting_confirmation,
        })),
    )
}

/// =============================
/// Session Inspection
/// =============================

async fn session_handler(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    let session_id = session_id_from(Some(id.as_str()));

    match state.sessions.get(session_id).await {
        Some(session) => {
            let summary = session.lock().await.summary();
            (StatusCode::OK, Json(ApiResponse::success(summary)))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("Session {} not found", id))),
        ),
    }
}

async fn end_session_handler(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    let session_id = session_id_from(Some(id.as_str()));

    if state.sessions.remove(session_id).await {
        info!(session_id = %session_id, "Session ended");
        (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({ "session_id": session_id }))),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("Session {} not found", id))),
        )
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<DialogOrchestrator>, sessions: SessionStore) -> Router {
    let state = ApiState {
        orchestrator,
        sessions,
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route(
            "/api/sessions/:id",
            get(session_handler).delete(end_session_handler),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

/// Periodically drop sessions nobody has talked to within `ttl`.
fn spawn_session_sweeper(sessions: SessionStore, ttl: Duration) {
    let period = (ttl / 4).max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let pruned = sessions.prune_idle(ttl).await;
            if pruned > 0 {
                let remaining = sessions.len().await;
                info!(pruned, remaining, "Idle sessions pruned");
            } else {
                debug!("No idle sessions to prune");
            }
        }
    });
}

pub async fn start_server(
    orchestrator: Arc<DialogOrchestrator>,
    port: u16,
    session_idle_ttl: Duration,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let sessions = SessionStore::new();
    spawn_session_sweeper(sessions.clone(), session_idle_ttl);
    let router = create_router(orchestrator, sessions);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
