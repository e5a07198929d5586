//! Account subsystem: records, storage, and lifecycle.

pub mod lifecycle;
pub mod store;
pub mod types;

pub use lifecycle::AccountLifecycle;
pub use store::{AccountError, AccountStore};
pub use types::{Account, AccountProfile, Role};
