//! Server-side session tracking.
//!
//! Sessions are independent of the bearer token: the token proves
//! identity claims, the session proves those claims have not been
//! revoked. Revocation removes the record, so a revoked id can never
//! validate again.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::RngCore;
use uuid::Uuid;

/// An active server-side session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub account_id: Uuid,
    pub issued_at: DateTime<Utc>,
}

/// Thread-safe session store with per-account revocation.
///
/// `create` and `invalidate_all_for_account` both operate while holding
/// the account's index entry, which serializes them per account: an
/// invalidate-all cannot lose a session created fractionally earlier in
/// the same request wave.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    by_account: DashMap<Uuid, HashSet<String>>,
}

fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for an account.
    pub fn create(&self, account_id: Uuid) -> Session {
        let session = Session {
            id: generate_session_id(),
            account_id,
            issued_at: Utc::now(),
        };

        // Hold the index entry while inserting so a concurrent
        // invalidate-all either runs strictly before or strictly after
        // this creation.
        let mut index = self.by_account.entry(account_id).or_default();
        self.sessions.insert(session.id.clone(), session.clone());
        index.insert(session.id.clone());
        drop(index);

        session
    }

    /// Resolve a session id to its account, if the session is live.
    pub fn validate(&self, session_id: &str) -> Option<Uuid> {
        self.sessions.get(session_id).map(|s| s.account_id)
    }

    /// Revoke a single session. Unknown ids are a no-op.
    pub fn invalidate(&self, session_id: &str) {
        if let Some((_, session)) = self.sessions.remove(session_id) {
            if let Some(mut index) = self.by_account.get_mut(&session.account_id) {
                index.remove(session_id);
            }
            tracing::debug!(account = %session.account_id, "session revoked");
        }
    }

    /// Revoke every session belonging to an account. Synchronous: once
    /// this returns, no previously issued session for the account will
    /// validate.
    pub fn invalidate_all_for_account(&self, account_id: Uuid) {
        if let Some((_, ids)) = self.by_account.remove(&account_id) {
            let count = ids.len();
            for id in ids {
                self.sessions.remove(&id);
            }
            if count > 0 {
                tracing::info!(account = %account_id, sessions = count, "all sessions revoked");
            }
        }
    }

    /// Number of live sessions for an account.
    pub fn count_for(&self, account_id: Uuid) -> usize {
        self.by_account
            .get(&account_id)
            .map(|ids| ids.len())
            .unwrap_or(0)
    }
}
