//! One-time code delivery.
//!
//! Delivery is an external collaborator that may fail; the backend only
//! hands it an address and a code.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("one-time code delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// The outbound side of the second factor.
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send_otp(&self, email: &str, code: &str) -> Result<(), DeliveryError>;
}

/// Default sender: logs the dispatch. The code itself only appears at
/// debug level so production logs stay clean.
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send_otp(&self, email: &str, code: &str) -> Result<(), DeliveryError> {
        tracing::info!(email = %email, "dispatching login one-time code");
        tracing::debug!(email = %email, code = %code, "one-time code issued");
        Ok(())
    }
}
