//! Per-request authorization against the configured [`AccessPolicy`].
//!
//! [`AccessPolicy`]: crate::auth::AccessPolicy

use axum::extract::{OriginalUri, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;
use super::routes::AppState;
use crate::auth::{PeerIdentity, Principal};

/// Ask the policy whether the connection's principal may perform the
/// request (action = method, resource = full path). Requests without a
/// [`PeerIdentity`] extension are anonymous.
pub async fn authorize(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let identity = req
        .extensions()
        .get::<PeerIdentity>()
        .cloned()
        .unwrap_or_default();
    let action = req.method().as_str().to_owned();
    let resource = req
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| req.uri().path().to_owned(), |uri| uri.0.path().to_owned());

    match state
        .policy
        .authorize(&action, &resource, identity.principal())
    {
        Ok(true) => next.run(req).await,
        Ok(false) => ApiError::Forbidden {
            principal: identity
                .principal()
                .map_or_else(|| "anonymous".to_string(), Principal::to_string),
            action,
            resource,
        }
        .into_response(),
        Err(e) => ApiError::Auth(e).into_response(),
    }
}
