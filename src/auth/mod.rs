//! Authentication subsystem: passwords, bearer tokens, one-time codes,
//! and the login state machine.

pub mod notifier;
pub mod otp;
pub mod password;
pub mod token;
pub mod verifier;

use thiserror::Error;

pub use notifier::{DeliveryError, LogOtpSender, OtpSender};
pub use otp::OtpStore;
pub use token::{TokenClaims, TokenService};
pub use verifier::{CredentialVerifier, LoginOutcome};

/// Authentication failures. Variants are distinguishable here; the HTTP
/// surface decides which ones collapse into generic messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("OTP required: a one-time code has been sent to your email")]
    OtpRequired,
    #[error("invalid or expired one-time code")]
    InvalidOtp,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("could not deliver the one-time code")]
    DeliveryFailed,
    #[error("password hashing failed")]
    HashFailure,
}
