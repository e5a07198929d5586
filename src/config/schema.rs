//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! backend. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the savings-account backend.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Authentication settings (token secret, OTP policy).
    pub auth: AuthConfig,

    /// Rate limiting classes.
    pub rate_limit: RateLimitConfig,

    /// Development-only settings.
    pub dev: DevConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3002").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3002".to_string(),
        }
    }
}

/// Which accounts must present a second factor at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPolicy {
    /// Every login requires a one-time code.
    Always,
    /// Only accounts still pending verification require a code.
    UnverifiedOnly,
    /// Password alone is sufficient.
    Never,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret used to sign bearer tokens.
    pub token_secret: String,

    /// Bearer token lifetime in seconds.
    pub token_ttl_secs: u64,

    /// One-time code lifetime in seconds.
    pub otp_ttl_secs: u64,

    /// Second-factor policy.
    pub otp_policy: OtpPolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            token_secret: "CHANGE_ME_IN_PRODUCTION".to_string(),
            token_ttl_secs: 24 * 60 * 60,
            otp_ttl_secs: 300,
            otp_policy: OtpPolicy::UnverifiedOnly,
        }
    }
}

/// Ceiling and window for one rate limiter class.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RateLimitClassConfig {
    /// Maximum requests allowed per window.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

/// Rate limiting configuration, one class per endpoint group.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Login/registration surface (tightest).
    pub auth: RateLimitClassConfig,

    /// Reads and benign updates (loosest).
    pub general: RateLimitClassConfig,

    /// Financial mutations and account deletion.
    pub strict: RateLimitClassConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            auth: RateLimitClassConfig {
                max_requests: 10,
                window_secs: 900,
            },
            general: RateLimitClassConfig {
                max_requests: 100,
                window_secs: 900,
            },
            strict: RateLimitClassConfig {
                max_requests: 30,
                window_secs: 900,
            },
        }
    }
}

/// Development-only toggles. Must stay off in production configs.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DevConfig {
    /// Mount POST /api/dev/clear-rate-limits.
    pub enable_rate_limit_reset: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_complete() {
        let config = AppConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3002");
        assert_eq!(config.auth.otp_policy, OtpPolicy::UnverifiedOnly);
        assert!(config.rate_limit.auth.max_requests < config.rate_limit.general.max_requests);
        assert!(!config.dev.enable_rate_limit_reset);
    }

    #[test]
    fn test_minimal_toml_parses() {
        let config: AppConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [auth]
            otp_policy = "always"

            [rate_limit.auth]
            max_requests = 3
            window_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.auth.otp_policy, OtpPolicy::Always);
        assert_eq!(config.rate_limit.auth.max_requests, 3);
        // Untouched sections keep their defaults.
        assert_eq!(config.rate_limit.general.max_requests, 100);
    }
}
