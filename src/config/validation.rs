//! Configuration validation.
//!
//! Semantic checks that serde cannot express: non-empty secrets, non-zero
//! windows and ceilings, and the rule that the dev reset endpoint never
//! ships on a non-loopback bind. Returns all errors, not just the first.

use std::fmt;

use crate::config::schema::{AppConfig, RateLimitClassConfig};

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_class(field: &str, class: &RateLimitClassConfig, errors: &mut Vec<ValidationError>) {
    if class.max_requests == 0 {
        errors.push(ValidationError {
            field: format!("rate_limit.{field}.max_requests"),
            message: "must be greater than zero".to_string(),
        });
    }
    if class.window_secs == 0 {
        errors.push(ValidationError {
            field: format!("rate_limit.{field}.window_secs"),
            message: "must be greater than zero".to_string(),
        });
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.token_secret.is_empty() {
        errors.push(ValidationError {
            field: "auth.token_secret".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    if config.auth.token_ttl_secs == 0 {
        errors.push(ValidationError {
            field: "auth.token_ttl_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if config.auth.otp_ttl_secs == 0 {
        errors.push(ValidationError {
            field: "auth.otp_ttl_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    check_class("auth", &config.rate_limit.auth, &mut errors);
    check_class("general", &config.rate_limit.general, &mut errors);
    check_class("strict", &config.rate_limit.strict, &mut errors);

    if config.dev.enable_rate_limit_reset {
        let loopback = config.listener.bind_address.starts_with("127.")
            || config.listener.bind_address.starts_with("localhost");
        if !loopback {
            errors.push(ValidationError {
                field: "dev.enable_rate_limit_reset".to_string(),
                message: "dev reset endpoint requires a loopback bind address".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
