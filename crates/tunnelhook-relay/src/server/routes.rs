//! HTTP routes.
//!
//! | Method | Path                                  | Handler          |
//! |--------|---------------------------------------|------------------|
//! | POST   | `/api/v1/event`                       | [`post_event`]   |
//! | GET    | `/api/v1/tunnel`                      | [`get_tunnel`]   |
//! | POST   | `/api/v1/webhook/{team}/{bot}/{token}`| [`post_webhook`] |
//! | GET    | `/api/v1/webhook/{team}/{bot}/{token}`| [`get_webhook`]  |
//! | GET    | `/health`                             | [`health`]       |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::warn;
use tunnelhook_core::canonical::{Canonicalize, EventCanonicalizer};
use tunnelhook_core::types::{
    IncomingEvent, TunnelInterface, WebhookRequest, WebhookResponse, WebhookUrl,
};

use super::error::ApiError;
use crate::auth::AccessPolicy;
use crate::relay::{HookPath, WebhookRelay};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<WebhookRelay>,
    pub canonicalizer: Arc<dyn Canonicalize>,
    pub policy: Arc<dyn AccessPolicy>,
}

impl AppState {
    pub fn new(relay: WebhookRelay, policy: Arc<dyn AccessPolicy>) -> Self {
        Self {
            relay: Arc::new(relay),
            canonicalizer: Arc::new(EventCanonicalizer::new()),
            policy,
        }
    }

    /// Replace the event canonicalizer.
    #[must_use]
    pub fn with_canonicalizer(mut self, canonicalizer: Arc<dyn Canonicalize>) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }
}

/// Build the relay's router. Everything under `/api/v1` goes through the
/// authorization middleware.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/event", post(post_event))
        .route("/tunnel", get(get_tunnel))
        .route(
            "/webhook/{team}/{bot}/{token}",
            post(post_webhook).get(get_webhook),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            super::middleware::authorize,
        ));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /api/v1/event`: canonicalize for the audit log and echo the event.
///
/// A canonicalization failure still answers 200, carrying the error next to
/// the original event.
pub async fn post_event(
    State(state): State<AppState>,
    Json(event): Json<IncomingEvent>,
) -> Response {
    match state.canonicalizer.canonicalize(&event) {
        Ok(_) => Json(event).into_response(),
        Err(e) => {
            let message = format!("Failed to convert event to canonical form: {e}");
            warn!(error = %e, "Event canonicalization failed");
            (
                StatusCode::OK,
                Json(json!({
                    "code": StatusCode::OK.as_u16(),
                    "message": message,
                    "event": event,
                })),
            )
                .into_response()
        }
    }
}

/// `GET /api/v1/tunnel`: the tunnel's current public URL.
pub async fn get_tunnel(State(state): State<AppState>) -> Result<Json<TunnelInterface>, ApiError> {
    Ok(Json(state.relay.resolver().resolve().await?))
}

/// `POST /api/v1/webhook/{team}/{bot}/{token}`: relay to the provider.
pub async fn post_webhook(
    State(state): State<AppState>,
    Path(path): Path<HookPath>,
    Json(request): Json<WebhookRequest>,
) -> Result<Json<WebhookResponse>, ApiError> {
    path.validate().map_err(ApiError::BadRequest)?;
    Ok(Json(state.relay.relay(&path, request).await?))
}

/// `GET /api/v1/webhook/{team}/{bot}/{token}`: relay an empty request and
/// report the callback URL handed to the provider.
pub async fn get_webhook(
    State(state): State<AppState>,
    Path(path): Path<HookPath>,
) -> Result<Json<WebhookUrl>, ApiError> {
    path.validate().map_err(ApiError::BadRequest)?;
    Ok(Json(state.relay.webhook_url(&path).await?))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
