//! HTTP subsystem: server wiring and the error taxonomy.

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, HttpServer};
