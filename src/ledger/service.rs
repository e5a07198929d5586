//! Transaction creation and balance derivation.
//!
//! # Responsibilities
//! - Append deposit/withdrawal rows and keep the derived balance in step
//! - Serialize all mutations of one account through an exclusive scope
//! - Reject overdrafts before any state is written
//!
//! # Design Decisions
//! - The exclusive scope is an in-process async lock map keyed by
//!   account id; guards are RAII so the scope releases on every exit
//!   path, including errors and cancellation
//! - The scope spans exactly one transaction creation and never a call
//!   to another service

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::account::store::{AccountError, AccountStore};
use crate::ledger::types::{Transaction, TxKind, TxStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("a positive amount is required")]
    InvalidAmount,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("account not found")]
    AccountNotFound,
    #[error("transaction could not be applied")]
    BalanceUpdateFailed,
}

/// Creates transactions and derives balances atomically per account.
pub struct LedgerService {
    accounts: Arc<AccountStore>,
    transactions: DashMap<Uuid, Vec<Transaction>>,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl LedgerService {
    pub fn new(accounts: Arc<AccountStore>) -> Self {
        Self {
            accounts,
            transactions: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    /// The per-account exclusive scope. Every balance mutation for one
    /// account funnels through the same mutex.
    fn account_lock(&self, account_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        Ok(())
    }

    fn append_row(&self, tx: &Transaction) {
        self.transactions
            .entry(tx.account_id)
            .or_default()
            .push(tx.clone());
    }

    fn set_status(&self, account_id: Uuid, tx_id: Uuid, status: TxStatus) {
        if let Some(mut rows) = self.transactions.get_mut(&account_id) {
            if let Some(row) = rows.iter_mut().find(|t| t.id == tx_id) {
                row.status = status;
            }
        }
    }

    /// Credit an account. The pending row is appended first; if the
    /// balance update cannot be applied the row is marked failed and the
    /// balance stays untouched.
    pub async fn deposit(
        &self,
        account_id: Uuid,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        Self::validate_amount(amount)?;

        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;

        if !self.accounts.exists(account_id) {
            return Err(LedgerError::AccountNotFound);
        }

        let mut tx = Transaction::pending(account_id, TxKind::Deposit, amount, description);
        self.append_row(&tx);

        match self.accounts.credit(account_id, amount) {
            Ok(balance) => {
                self.set_status(account_id, tx.id, TxStatus::Completed);
                tx.status = TxStatus::Completed;
                tracing::info!(account = %account_id, tx = %tx.id, %amount, %balance, "deposit completed");
                Ok(tx)
            }
            Err(_) => {
                self.set_status(account_id, tx.id, TxStatus::Failed);
                tracing::error!(account = %account_id, tx = %tx.id, "deposit failed after row insert");
                Err(LedgerError::BalanceUpdateFailed)
            }
        }
    }

    /// Debit an account. The balance precondition is checked inside the
    /// exclusive scope, before any row is written: a rejected withdrawal
    /// leaves no trace.
    pub async fn withdraw(
        &self,
        account_id: Uuid,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        Self::validate_amount(amount)?;

        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;

        let balance = self
            .accounts
            .balance_of(account_id)
            .map_err(|_| LedgerError::AccountNotFound)?;
        if amount > balance {
            tracing::warn!(account = %account_id, %amount, %balance, "withdrawal rejected");
            return Err(LedgerError::InsufficientFunds);
        }

        let mut tx = Transaction::pending(account_id, TxKind::Withdrawal, amount, description);
        self.append_row(&tx);

        match self.accounts.debit(account_id, amount) {
            Ok(balance) => {
                self.set_status(account_id, tx.id, TxStatus::Completed);
                tx.status = TxStatus::Completed;
                tracing::info!(account = %account_id, tx = %tx.id, %amount, %balance, "withdrawal completed");
                Ok(tx)
            }
            Err(_) => {
                self.set_status(account_id, tx.id, TxStatus::Failed);
                tracing::error!(account = %account_id, tx = %tx.id, "withdrawal failed after row insert");
                Err(LedgerError::BalanceUpdateFailed)
            }
        }
    }

    /// Current derived balance.
    pub fn balance(&self, account_id: Uuid) -> Result<Decimal, LedgerError> {
        self.accounts
            .balance_of(account_id)
            .map_err(|_| LedgerError::AccountNotFound)
    }

    /// Reverse-chronological snapshot of an account's transactions.
    pub fn transactions(&self, account_id: Uuid) -> Vec<Transaction> {
        self.transactions
            .get(&account_id)
            .map(|rows| rows.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove an account and its transaction history under the same
    /// exclusive scope that guards money movement, so deletion cannot
    /// interleave with an in-flight deposit or withdrawal.
    pub async fn purge_account(&self, account_id: Uuid) -> Result<(), AccountError> {
        let lock = self.account_lock(account_id);
        let guard = lock.lock().await;

        let removed = self.accounts.remove(account_id);
        self.transactions.remove(&account_id);

        drop(guard);
        self.locks.remove(&account_id);

        if removed {
            Ok(())
        } else {
            Err(AccountError::NotFound)
        }
    }
}
