//! One-time login codes.
//!
//! Single slot per account: issuing a code replaces (and thereby
//! invalidates) any outstanding one. Codes are time-boxed and consumed
//! on first successful verification.

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use uuid::Uuid;

use crate::auth::AuthError;

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    issued_at: DateTime<Utc>,
}

/// Per-account one-time code storage.
pub struct OtpStore {
    entries: DashMap<Uuid, OtpEntry>,
    ttl: Duration,
}

impl OtpStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Generate a fresh six-digit code for an account, displacing any
    /// previously issued code.
    pub fn issue(&self, account_id: Uuid) -> String {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32));
        self.entries.insert(
            account_id,
            OtpEntry {
                code: code.clone(),
                issued_at: Utc::now(),
            },
        );
        code
    }

    /// Verify and consume an account's outstanding code.
    pub fn verify(&self, account_id: Uuid, code: &str) -> Result<(), AuthError> {
        match self.entries.entry(account_id) {
            Entry::Occupied(entry) => {
                if Utc::now() - entry.get().issued_at > self.ttl {
                    entry.remove();
                    return Err(AuthError::InvalidOtp);
                }
                if entry.get().code != code {
                    return Err(AuthError::InvalidOtp);
                }
                entry.remove();
                Ok(())
            }
            Entry::Vacant(_) => Err(AuthError::InvalidOtp),
        }
    }
}
