//! Authentication surface handlers.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::account::{Account, AccountProfile};
use crate::api::{message, MessageResponse};
use crate::auth::password;
use crate::http::{ApiError, AppState};
use crate::security::gate::{self, AuthContext};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Create an account, pending verification.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let name = req.name.trim();
    let email = req.email.trim();

    if name.is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::Validation("A valid email is required".to_string()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let hash = password::hash_password(&req.password)?;
    let account = Account::new(
        name.to_string(),
        email.to_string(),
        hash,
        req.device_id.unwrap_or_default(),
    );
    let account_id = account.id;
    state.accounts.insert(account)?;

    tracing::info!(account = %account_id, "account registered");
    Ok((
        StatusCode::CREATED,
        message("Account created. It is pending verification."),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub otp: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub session_id: String,
    pub user: AccountProfile,
}

/// Authenticate with password plus, when required, a one-time code.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let outcome = state
        .verifier
        .login(req.email.trim(), &req.password, req.otp.as_deref())
        .await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        session_id: outcome.session.id,
        user: outcome.profile,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ResendOtpRequest {
    pub email: String,
}

/// Rotate and redeliver a login code. The answer is identical whether or
/// not the account exists.
pub async fn resend_login_otp(
    State(state): State<AppState>,
    Json(req): Json<ResendOtpRequest>,
) -> Json<MessageResponse> {
    state.verifier.resend_login_otp(req.email.trim()).await;
    message("If the account requires a code, a new one has been sent")
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub otp: String,
}

/// Confirm an address by consuming its outstanding one-time code.
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.verifier.verify_email(req.email.trim(), &req.otp)?;
    Ok(message("Email verified successfully"))
}

/// Revoke the presented session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<MessageResponse> {
    if let Some(session_id) = gate::session_id(&headers) {
        state.sessions.invalidate(session_id);
    }
    message("Logged out successfully")
}

/// The authenticated caller's profile.
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<AccountProfile>, ApiError> {
    let account = state
        .accounts
        .get(ctx.account_id)
        .ok_or_else(ApiError::unauthenticated)?;
    Ok(Json(account.profile()))
}
