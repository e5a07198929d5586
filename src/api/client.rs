//! Client surface handlers: money movement and account upkeep.

use axum::{extract::State, http::StatusCode, Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::{message, MessageResponse};
use crate::http::{ApiError, AppState};
use crate::ledger::Transaction;
use crate::security::AuthContext;

#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub amount: Option<Decimal>,
    pub description: Option<String>,
}

impl TransactionRequest {
    fn amount(&self) -> Result<Decimal, ApiError> {
        match self.amount {
            Some(amount) if amount > Decimal::ZERO => Ok(amount),
            _ => Err(ApiError::Validation("Valid amount is required".to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: Decimal,
}

/// Reverse-chronological transaction history.
pub async fn transactions(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    if !state.accounts.exists(ctx.account_id) {
        return Err(ApiError::NotFound("Account not found".to_string()));
    }
    Ok(Json(state.ledger.transactions(ctx.account_id)))
}

/// Current balance.
pub async fn balance(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.ledger.balance(ctx.account_id)?;
    Ok(Json(BalanceResponse { balance }))
}

/// Credit the account. Returns the created transaction.
pub async fn deposit(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let amount = req.amount()?;
    let tx = state
        .ledger
        .deposit(ctx.account_id, amount, req.description)
        .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

/// Debit the account. Rejected before any state is written when the
/// balance cannot cover it.
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let amount = req.amount()?;
    let tx = state
        .ledger
        .withdraw(ctx.account_id, amount, req.description)
        .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceRequest {
    pub device_id: Option<String>,
}

/// Update the account's device identifier.
pub async fn update_device(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<UpdateDeviceRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let device_id = req
        .device_id
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::Validation("Device ID is required".to_string()))?;

    state
        .accounts
        .update_device(ctx.account_id, device_id.to_string())?;
    Ok(message("Device ID updated successfully"))
}

/// Delete the account: sessions first, then the cascading delete.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.lifecycle.delete_account(ctx.account_id).await?;
    Ok(message("Account deleted successfully"))
}
