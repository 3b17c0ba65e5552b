//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use storefront_core::ports::PortError;
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;

/// The authenticated caller, inserted into request extensions by
/// [`require_auth`].
#[derive(Clone, Copy, Debug)]
pub struct AuthedUser(pub Uuid);

/// Middleware that resolves the session token and extracts the user id.
///
/// The httpOnly `session` cookie set by the auth service takes precedence;
/// an `Authorization: Bearer` header is accepted as a fallback. If neither
/// resolves, the request is rejected with 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Prefer the session cookie.
    let cookie_token = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|c| {
                let c = c.trim();
                c.strip_prefix("session=")
            })
        });

    // 2. Fall back to a bearer token.
    let bearer_token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let token = cookie_token
        .or(bearer_token)
        .ok_or(ApiError::Port(PortError::Unauthorized))?;

    // 3. Resolve the token to a user id.
    let user_id = state.identity.resolve_session(token).await.map_err(|e| {
        warn!("Failed to resolve session token: {:?}", e);
        ApiError::Port(PortError::Unauthorized)
    })?;

    // 4. Insert the authenticated user into request extensions.
    req.extensions_mut().insert(AuthedUser(user_id));

    // 5. Continue to the handler.
    Ok(next.run(req).await)
}
