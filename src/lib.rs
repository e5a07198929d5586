//! Savings-Account Client Backend Library

pub mod account;
pub mod api;
pub mod auth;
pub mod config;
pub mod http;
pub mod ledger;
pub mod lifecycle;
pub mod security;
pub mod session;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
