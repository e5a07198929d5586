//! In-process account store.
//!
//! Stands in for the external transactional data store: per-account
//! update serialization is supplied by the ledger's per-account lock, and
//! the email index enforces registration uniqueness atomically.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::account::types::Account;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("account not found")]
    NotFound,
    #[error("email is already registered")]
    EmailTaken,
    #[error("insufficient funds")]
    InsufficientFunds,
}

/// Thread-safe account storage with a unique email index.
#[derive(Default)]
pub struct AccountStore {
    accounts: DashMap<Uuid, Account>,
    email_index: DashMap<String, Uuid>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new account, enforcing email uniqueness.
    ///
    /// The email index entry is claimed first; a racing registration for
    /// the same address loses on the index, never on the account map.
    pub fn insert(&self, account: Account) -> Result<(), AccountError> {
        match self.email_index.entry(account.email.to_ascii_lowercase()) {
            Entry::Occupied(_) => Err(AccountError::EmailTaken),
            Entry::Vacant(slot) => {
                slot.insert(account.id);
                self.accounts.insert(account.id, account);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Account> {
        self.accounts.get(&id).map(|a| a.clone())
    }

    pub fn get_by_email(&self, email: &str) -> Option<Account> {
        let id = *self.email_index.get(&email.to_ascii_lowercase())?;
        self.get(id)
    }

    pub fn exists(&self, id: Uuid) -> bool {
        self.accounts.contains_key(&id)
    }

    pub fn balance_of(&self, id: Uuid) -> Result<Decimal, AccountError> {
        self.accounts
            .get(&id)
            .map(|a| a.balance)
            .ok_or(AccountError::NotFound)
    }

    /// Add to a balance. Callers must hold the account's ledger lock.
    pub fn credit(&self, id: Uuid, amount: Decimal) -> Result<Decimal, AccountError> {
        let mut account = self.accounts.get_mut(&id).ok_or(AccountError::NotFound)?;
        account.balance += amount;
        Ok(account.balance)
    }

    /// Subtract from a balance. Callers must hold the account's ledger
    /// lock and have verified sufficiency; the check here is the last
    /// line of defense, not the primary one.
    pub fn debit(&self, id: Uuid, amount: Decimal) -> Result<Decimal, AccountError> {
        let mut account = self.accounts.get_mut(&id).ok_or(AccountError::NotFound)?;
        if account.balance < amount {
            return Err(AccountError::InsufficientFunds);
        }
        account.balance -= amount;
        Ok(account.balance)
    }

    pub fn mark_verified(&self, id: Uuid) -> Result<(), AccountError> {
        let mut account = self.accounts.get_mut(&id).ok_or(AccountError::NotFound)?;
        account.is_verified = true;
        Ok(())
    }

    pub fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AccountError> {
        let mut account = self.accounts.get_mut(&id).ok_or(AccountError::NotFound)?;
        account.last_login = Some(at);
        Ok(())
    }

    pub fn update_device(&self, id: Uuid, device_id: String) -> Result<(), AccountError> {
        let mut account = self.accounts.get_mut(&id).ok_or(AccountError::NotFound)?;
        account.device_id = device_id;
        Ok(())
    }

    /// Remove an account and its email index entry. Returns whether a
    /// record was actually removed.
    pub fn remove(&self, id: Uuid) -> bool {
        match self.accounts.remove(&id) {
            Some((_, account)) => {
                self.email_index
                    .remove(&account.email.to_ascii_lowercase());
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
