//! Bearer-token + session verification and the role check.
//!
//! A request must present both a valid token and a session id that maps
//! to the same live account; either failing alone is an authentication
//! failure, not a partial success.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::account::Role;
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Header carrying the server-side session id.
pub const SESSION_HEADER: &str = "x-session-id";

/// Context attached to authenticated requests.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub account_id: Uuid,
    pub role: Role,
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Pull the session id header.
pub fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok())
}

/// Middleware: verify token and session, attach [`AuthContext`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or_else(ApiError::unauthenticated)?;
    let claims = state
        .tokens
        .verify(token)
        .map_err(|_| ApiError::unauthenticated())?;

    let session_id = session_id(request.headers()).ok_or_else(ApiError::unauthenticated)?;
    let session_account = state
        .sessions
        .validate(session_id)
        .ok_or_else(ApiError::unauthenticated)?;

    // Token and session must agree on who is calling.
    if session_account != claims.account_id {
        tracing::warn!(token_account = %claims.account_id, "session/token account mismatch");
        return Err(ApiError::unauthenticated());
    }

    let account = state
        .accounts
        .get(claims.account_id)
        .ok_or_else(ApiError::unauthenticated)?;

    request.extensions_mut().insert(AuthContext {
        account_id: account.id,
        role: account.role,
    });

    Ok(next.run(request).await)
}

/// Middleware: the authenticated caller must hold the Client role.
pub async fn require_client(request: Request<Body>, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<AuthContext>() {
        Some(ctx) if ctx.role == Role::Client => Ok(next.run(request).await),
        Some(ctx) => {
            tracing::warn!(account = %ctx.account_id, role = ?ctx.role, "role check failed");
            Err(ApiError::forbidden())
        }
        // require_auth did not run; treat as unauthenticated rather than
        // leaking an internal wiring mistake.
        None => Err(ApiError::unauthenticated()),
    }
}
