//! HTTP Server - Signal Intake and Operational Control
//!
//! Routes:
//! - `POST /webhook`        - signal intake (rate limited, HMAC verified)
//! - `GET  /status`         - full operational status
//! - `GET  /automation`     - current automation phase
//! - `POST /automation`     - switch automation phase
//! - `POST /emergency-stop` - trip the emergency stop
//! - `POST /reset-emergency`- clear the emergency stop
//! - `GET  /health`         - persistence health probe
//! - `GET  /metrics`        - Prometheus text exposition

use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::auth::WebhookAuth;
use crate::adapters::metrics::SignalMetrics;
use crate::config::ServerConfig;
use crate::domain::signal::RawSignal;
use crate::ports::repository::Repository;
use crate::usecases::processor::SignalProcessor;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    processor: Arc<SignalProcessor>,
    metrics: Arc<SignalMetrics>,
    repository: Arc<dyn Repository>,
    auth: Option<Arc<WebhookAuth>>,
    limiter: Arc<DirectRateLimiter>,
}

impl AppState {
    /// Wire the handler state from configuration and the shared
    /// processor, metrics, and repository instances.
    pub fn new(
        config: &ServerConfig,
        processor: Arc<SignalProcessor>,
        metrics: Arc<SignalMetrics>,
        repository: Arc<dyn Repository>,
    ) -> Self {
        let per_minute =
            NonZeroU32::new(config.max_signals_per_minute).unwrap_or(NonZeroU32::MIN);
        let auth = (!config.webhook_secret.is_empty())
            .then(|| Arc::new(WebhookAuth::new(config.webhook_secret.clone())));

        Self {
            processor,
            metrics,
            repository,
            auth,
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        }
    }
}

/// Build the full route table.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/status", get(status))
        .route("/automation", get(get_automation).post(set_automation))
        .route("/emergency-stop", post(emergency_stop))
        .route("/reset-emergency", post(reset_emergency))
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .with_state(state)
}

/// Serve the router until the shutdown signal arrives.
pub async fn serve(
    state: AppState,
    bind_address: &str,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!(address = %bind_address, "Signal intake server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    Ok(())
}

async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if state.limiter.check().is_err() {
        warn!("Webhook rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"status": "error", "reason": "Rate limit exceeded"})),
        )
            .into_response();
    }

    if let Some(auth) = &state.auth {
        let signature = headers.get("x-signature").and_then(|v| v.to_str().ok());
        if !auth.verify(&body, signature) {
            warn!("Webhook signature verification failed");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"status": "error", "reason": "Invalid signature"})),
            )
                .into_response();
        }
    }

    let raw: RawSignal = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "status": "error",
                    "reason": format!("Malformed JSON payload: {e}")
                })),
            )
                .into_response();
        }
    };

    let decision = state.processor.process_signal(raw).await;
    state.metrics.observe_decision(&decision);
    (StatusCode::OK, Json(decision)).into_response()
}

async fn status(State(state): State<AppState>) -> Response {
    let report = state.processor.status();
    state.metrics.update_from_status(&report);
    Json(report).into_response()
}

async fn get_automation(State(state): State<AppState>) -> Response {
    Json(json!({"phase": state.processor.phase()})).into_response()
}

#[derive(Debug, Deserialize)]
struct PhaseRequest {
    phase: String,
}

async fn set_automation(
    State(state): State<AppState>,
    Json(request): Json<PhaseRequest>,
) -> Response {
    match state.processor.set_phase(&request.phase) {
        Ok(phase) => Json(json!({"phase": phase})).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": "error", "reason": e.to_string()})),
        )
            .into_response(),
    }
}

async fn emergency_stop(State(state): State<AppState>) -> Response {
    state.processor.set_emergency_stop();
    Json(json!({"emergency_stop": true})).into_response()
}

async fn reset_emergency(State(state): State<AppState>) -> Response {
    state.processor.reset_emergency_stop();
    Json(json!({"emergency_stop": false})).into_response()
}

async fn health(State(state): State<AppState>) -> Response {
    if state.repository.is_healthy().await {
        Json(json!({"status": "ok"})).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "degraded", "reason": "persistence unavailable"})),
        )
            .into_response()
    }
}

async fn metrics_text(State(state): State<AppState>) -> Response {
    let report = state.processor.status();
    state.metrics.update_from_status(&report);
    state.metrics.render().into_response()
}
