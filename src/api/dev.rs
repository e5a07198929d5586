//! Development-only handlers. Never mounted in production configs;
//! config validation enforces the loopback-bind rule.

use axum::{extract::State, Json};

use crate::api::{message, MessageResponse};
use crate::http::AppState;

/// Reset every rate limiter bucket.
pub async fn clear_rate_limits(State(state): State<AppState>) -> Json<MessageResponse> {
    state.limiters.clear_all();
    tracing::warn!("all rate limit buckets cleared via dev endpoint");
    message("Rate limits cleared")
}
