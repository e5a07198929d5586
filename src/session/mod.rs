//! Session subsystem.

pub mod store;

pub use store::{Session, SessionStore};
