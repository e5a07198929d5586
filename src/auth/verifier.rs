//! Credential verification and the login state machine.
//!
//! A login attempt moves AwaitingCredentials → AwaitingOtp →
//! Authenticated. The intermediate state lives client-side (the caller
//! retries with a code); here each transition is one call. Failure
//! variants are distinguishable internally; the HTTP surface collapses
//! them into generic messages to resist account enumeration.

use std::sync::Arc;

use chrono::Utc;

use crate::account::{AccountProfile, AccountStore};
use crate::auth::notifier::OtpSender;
use crate::auth::otp::OtpStore;
use crate::auth::token::TokenService;
use crate::auth::{password, AuthError};
use crate::config::OtpPolicy;
use crate::session::{Session, SessionStore};

/// Result of a fully authenticated login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub session: Session,
    pub profile: AccountProfile,
}

/// Validates passwords and one-time codes, and issues sessions and
/// tokens on the terminal state.
pub struct CredentialVerifier {
    accounts: Arc<AccountStore>,
    sessions: Arc<SessionStore>,
    tokens: Arc<TokenService>,
    otp: OtpStore,
    sender: Arc<dyn OtpSender>,
    policy: OtpPolicy,
}

impl CredentialVerifier {
    pub fn new(
        accounts: Arc<AccountStore>,
        sessions: Arc<SessionStore>,
        tokens: Arc<TokenService>,
        otp: OtpStore,
        sender: Arc<dyn OtpSender>,
        policy: OtpPolicy,
    ) -> Self {
        Self {
            accounts,
            sessions,
            tokens,
            otp,
            sender,
            policy,
        }
    }

    fn requires_second_factor(&self, is_verified: bool) -> bool {
        match self.policy {
            OtpPolicy::Always => true,
            OtpPolicy::UnverifiedOnly => !is_verified,
            OtpPolicy::Never => false,
        }
    }

    /// Attempt a login. Without a code, accounts under the second-factor
    /// policy get a fresh code delivered and `OtpRequired` back; with a
    /// code, it is verified and consumed.
    pub async fn login(
        &self,
        email: &str,
        supplied_password: &str,
        otp: Option<&str>,
    ) -> Result<LoginOutcome, AuthError> {
        let account = self
            .accounts
            .get_by_email(email)
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(supplied_password, &account.password_hash) {
            tracing::warn!(account = %account.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        if self.requires_second_factor(account.is_verified) {
            match otp {
                None => {
                    let code = self.otp.issue(account.id);
                    self.sender
                        .send_otp(&account.email, &code)
                        .await
                        .map_err(|e| {
                            tracing::error!(account = %account.id, error = %e, "otp delivery failed");
                            AuthError::DeliveryFailed
                        })?;
                    return Err(AuthError::OtpRequired);
                }
                Some(code) => self.otp.verify(account.id, code)?,
            }
        }

        let now = Utc::now();
        let _ = self.accounts.touch_last_login(account.id, now);

        let session = self.sessions.create(account.id);
        let token = self.tokens.issue(account.id);

        // Re-read so the profile reflects the login we just recorded.
        let profile = self
            .accounts
            .get(account.id)
            .ok_or(AuthError::InvalidCredentials)?
            .profile();

        tracing::info!(account = %account.id, session = %session.id, "login completed");

        Ok(LoginOutcome {
            token,
            session,
            profile,
        })
    }

    /// Rotate and redeliver an account's login code. Silent about
    /// whether the account exists or needs a second factor; the HTTP
    /// surface always answers generically.
    pub async fn resend_login_otp(&self, email: &str) {
        let Some(account) = self.accounts.get_by_email(email) else {
            return;
        };
        if !self.requires_second_factor(account.is_verified) {
            return;
        }

        let code = self.otp.issue(account.id);
        if let Err(e) = self.sender.send_otp(&account.email, &code).await {
            tracing::warn!(account = %account.id, error = %e, "otp redelivery failed");
        }
    }

    /// Mark an account verified, consuming its outstanding code as the
    /// email-possession proof.
    pub fn verify_email(&self, email: &str, code: &str) -> Result<(), AuthError> {
        let account = self
            .accounts
            .get_by_email(email)
            .ok_or(AuthError::InvalidOtp)?;

        self.otp.verify(account.id, code)?;
        self.accounts
            .mark_verified(account.id)
            .map_err(|_| AuthError::InvalidOtp)?;

        tracing::info!(account = %account.id, "email verified");
        Ok(())
    }
}
