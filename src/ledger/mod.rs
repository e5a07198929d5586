//! Ledger subsystem: the append-only transaction log plus the derived
//! balance it backs.

pub mod service;
pub mod types;

pub use service::{LedgerError, LedgerService};
pub use types::{Transaction, TxKind, TxStatus};
