//! Account deletion orchestration.
//!
//! Ordering is deliberate: sessions are revoked (and that revocation is
//! awaited) before the record is touched, so a failed delete still
//! leaves the account locked out.

use std::sync::Arc;

use uuid::Uuid;

use crate::account::store::{AccountError, AccountStore};
use crate::ledger::LedgerService;
use crate::session::SessionStore;

/// Orchestrates the destructive end of an account's life.
pub struct AccountLifecycle {
    accounts: Arc<AccountStore>,
    sessions: Arc<SessionStore>,
    ledger: Arc<LedgerService>,
}

impl AccountLifecycle {
    pub fn new(
        accounts: Arc<AccountStore>,
        sessions: Arc<SessionStore>,
        ledger: Arc<LedgerService>,
    ) -> Self {
        Self {
            accounts,
            sessions,
            ledger,
        }
    }

    /// Delete an account: revoke every session, then cascade-delete the
    /// record and its transactions. Reports `NotFound` when no record
    /// was removed.
    pub async fn delete_account(&self, account_id: Uuid) -> Result<(), AccountError> {
        self.sessions.invalidate_all_for_account(account_id);

        self.ledger.purge_account(account_id).await?;

        tracing::info!(account = %account_id, "account deleted");
        debug_assert!(!self.accounts.exists(account_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::types::Account;
    use rust_decimal::Decimal;

    fn fixture() -> (AccountLifecycle, Arc<SessionStore>, Arc<LedgerService>, Uuid) {
        let accounts = Arc::new(AccountStore::new());
        let sessions = Arc::new(SessionStore::new());
        let ledger = Arc::new(LedgerService::new(accounts.clone()));

        let account = Account::new(
            "Test User".to_string(),
            "del@example.com".to_string(),
            "hash".to_string(),
            "device-1".to_string(),
        );
        let id = account.id;
        accounts.insert(account).unwrap();

        let lifecycle = AccountLifecycle::new(accounts, sessions.clone(), ledger.clone());
        (lifecycle, sessions, ledger, id)
    }

    #[tokio::test]
    async fn test_delete_revokes_sessions_and_cascades() {
        let (lifecycle, sessions, ledger, id) = fixture();

        let s1 = sessions.create(id);
        let s2 = sessions.create(id);
        ledger.deposit(id, Decimal::from(40), None).await.unwrap();

        lifecycle.delete_account(id).await.unwrap();

        assert_eq!(sessions.validate(&s1.id), None);
        assert_eq!(sessions.validate(&s2.id), None);
        assert!(ledger.transactions(id).is_empty());
        assert!(ledger.balance(id).is_err());
    }

    #[tokio::test]
    async fn test_delete_unknown_account_reports_not_found() {
        let (lifecycle, _, _, _) = fixture();
        let err = lifecycle.delete_account(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err, AccountError::NotFound);
    }

    #[tokio::test]
    async fn test_double_delete_reports_not_found() {
        let (lifecycle, _, _, id) = fixture();
        lifecycle.delete_account(id).await.unwrap();
        assert_eq!(
            lifecycle.delete_account(id).await.unwrap_err(),
            AccountError::NotFound
        );
    }
}
