//! Request gating: the ordered middleware chain every request passes
//! through (rate limit → token → session → role → handler). Each stage
//! is a short-circuiting axum middleware, independently testable.

pub mod gate;
pub mod rate_limit;

pub use gate::{require_auth, require_client, AuthContext};
pub use rate_limit::{rate_limit_middleware, RateLimiter, RateLimiters};
