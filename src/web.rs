//! Web Submission and Administration Surface
//!
//! Optional HTTP endpoint. Submissions arrive as JSON, get translated to
//! the same 8-field wire form the sockets speak, and flow through the
//! identical decode → intake path, so the HTTP bridge can never admit
//! something a socket producer could not. The administration routes are
//! pure operations on the history log and suppression table; they carry
//! no scheduling semantics. Static assets for the UI are served from a
//! configurable directory.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, services::ServeDir};
use uuid::Uuid;

use crate::engine::{EngineState, SubmitOutcome};
use crate::wire;

/// Default web UI port
pub const DEFAULT_PORT: u16 = 5501;

#[derive(Clone)]
struct WebState {
    engine: Arc<EngineState>,
}

#[derive(Debug)]
enum ApiError {
    /// Request body failed wire validation
    BadRequest(String),
    /// Referenced entity does not exist
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };
        (status, Json(json!({ "status": "error", "message": message }))).into_response()
    }
}

/// JSON submission body; field names match the wire protocol's camelCase
#[derive(Debug, Deserialize)]
struct SendMessageBody {
    #[serde(default = "default_priority")]
    priority: i64,
    #[serde(default, rename = "blinkMode")]
    blink_mode: i64,
    #[serde(default)]
    text: String,
    #[serde(default = "default_color")]
    color: String,
    #[serde(default = "default_bg_color", rename = "bgColor")]
    bg_color: String,
    #[serde(default = "default_speed")]
    speed: f64,
    #[serde(default, rename = "audioPath")]
    audio_path: String,
}

fn default_priority() -> i64 {
    1
}
fn default_color() -> String {
    "#ffffff".to_string()
}
fn default_bg_color() -> String {
    "#000000".to_string()
}
fn default_speed() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct IgnoreMessageBody {
    message_id: Uuid,
    #[serde(default = "default_ignore_minutes")]
    duration: u64,
}

fn default_ignore_minutes() -> u64 {
    5
}

/// Build the router; separated from `run` so tests can drive it directly.
pub fn router(engine: Arc<EngineState>, static_dir: PathBuf) -> Router {
    Router::new()
        .route("/api/send-message", post(send_message))
        .route("/api/message-history", get(message_history))
        .route("/api/clear-history", post(clear_history))
        .route("/api/ignore-message", post(ignore_message))
        .route("/api/current-message", get(current_message))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(WebState { engine })
}

/// Serve until shutdown. A bind failure is logged by the caller; only the
/// local socket transport is allowed to be fatal.
pub async fn run(
    engine: Arc<EngineState>,
    port: u16,
    static_dir: PathBuf,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind web server to {}", addr))?;

    info!("web interface listening on {}", addr);
    axum::serve(listener, router(engine, static_dir))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("web server failed")?;

    info!("web interface stopped");
    Ok(())
}

async fn send_message(
    State(state): State<WebState>,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // same 8-field form the sockets speak; decode does the validation
    let record = format!(
        "{}|{}|{}|{}|{}|{}|{}|",
        body.priority, body.blink_mode, body.text, body.color, body.bg_color, body.speed, body.audio_path
    );

    let request = wire::decode_str(&record).map_err(|err| {
        error!("rejected web submission: {}", err);
        ApiError::BadRequest(err.to_string())
    })?;

    let outcome = state.engine.submit(request);
    let (outcome_name, id) = match outcome {
        SubmitOutcome::Accepted(id) => ("accepted", Some(id)),
        SubmitOutcome::Suppressed => ("suppressed", None),
        SubmitOutcome::Deduplicated => ("deduplicated", None),
    };

    Ok(Json(json!({
        "status": "success",
        "outcome": outcome_name,
        "id": id,
    })))
}

async fn message_history(State(state): State<WebState>) -> Json<serde_json::Value> {
    Json(json!(state.engine.history().recent_first()))
}

async fn clear_history(State(state): State<WebState>) -> Json<serde_json::Value> {
    state.engine.clear_history();
    Json(json!({ "status": "success" }))
}

async fn ignore_message(
    State(state): State<WebState>,
    Json(body): Json<IgnoreMessageBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .engine
        .ignore(body.message_id, body.duration)
        .map_err(|err| ApiError::NotFound(err.to_string()))?;
    Ok(Json(json!({ "status": "success" })))
}

async fn current_message(State(state): State<WebState>) -> Json<serde_json::Value> {
    Json(json!({ "message": state.engine.active() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router(engine: &Arc<EngineState>) -> Router {
        router(Arc::clone(engine), PathBuf::from("static"))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_send_message_flows_through_intake() {
        let engine = Arc::new(EngineState::new());
        let app = test_router(&engine);

        let response = app
            .oneshot(post_json(
                "/api/send-message",
                json!({ "priority": 2, "text": "Hello", "speed": 0.5 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["outcome"], "accepted");

        assert_eq!(engine.queue_len(), 1);
        let history = engine.history().recent_first();
        assert_eq!(history[0].text, "Hello");
        assert_eq!(history[0].priority, 2);
    }

    #[tokio::test]
    async fn test_send_message_rejects_bad_speed() {
        let engine = Arc::new(EngineState::new());
        let app = test_router(&engine);

        let response = app
            .oneshot(post_json(
                "/api/send-message",
                json!({ "text": "Hello", "speed": 0.0 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(engine.queue_len(), 0);
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_most_recent_first() {
        let engine = Arc::new(EngineState::new());
        for text in ["first", "second"] {
            let req = wire::decode_str(&format!("1|0|{}|white|black|0.5||", text)).unwrap();
            engine.submit(req);
        }

        let response = test_router(&engine)
            .oneshot(Request::builder().uri("/api/message-history").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body[0]["message"], "second");
        assert_eq!(body[1]["message"], "first");
    }

    #[tokio::test]
    async fn test_ignore_then_clear_history_keeps_suppression() {
        let engine = Arc::new(EngineState::new());
        let req = wire::decode_str("1|0|Noisy|white|black|0.5||").unwrap();
        let SubmitOutcome::Accepted(id) = engine.submit(req) else {
            panic!("expected acceptance");
        };

        let response = test_router(&engine)
            .oneshot(post_json(
                "/api/ignore-message",
                json!({ "message_id": id, "duration": 5 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(engine.history().is_empty());

        let response = test_router(&engine)
            .oneshot(post_json("/api/clear-history", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // suppression survives the clear
        let again = wire::decode_str("1|0|noisy|white|black|0.5||").unwrap();
        assert_eq!(engine.submit(again), SubmitOutcome::Suppressed);
    }

    #[tokio::test]
    async fn test_ignore_unknown_id_is_not_found() {
        let engine = Arc::new(EngineState::new());
        let response = test_router(&engine)
            .oneshot(post_json(
                "/api/ignore-message",
                json!({ "message_id": Uuid::new_v4() }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_current_message_is_null_when_idle() {
        let engine = Arc::new(EngineState::new());
        let response = test_router(&engine)
            .oneshot(Request::builder().uri("/api/current-message").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert!(body["message"].is_null());
    }
}
