//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up the request gate per route group
//!   (rate limit → token → session → role → handler)
//! - Bind the server to a listener and serve until shutdown
//!
//! # Design Decisions
//! - The gate is layered outermost-first: the rate limiter always runs
//!   before any credential work
//! - Sessions, accounts, and the ledger share one `AppState`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::account::{AccountLifecycle, AccountStore};
use crate::api;
use crate::auth::{CredentialVerifier, LogOtpSender, OtpSender, OtpStore, TokenService};
use crate::config::AppConfig;
use crate::ledger::LedgerService;
use crate::security::{rate_limit_middleware, require_auth, require_client, RateLimiters};
use crate::session::SessionStore;

/// Total time budget for one request.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: Arc<AccountStore>,
    pub sessions: Arc<SessionStore>,
    pub tokens: Arc<TokenService>,
    pub ledger: Arc<LedgerService>,
    pub verifier: Arc<CredentialVerifier>,
    pub lifecycle: Arc<AccountLifecycle>,
    pub limiters: RateLimiters,
}

/// HTTP server for the savings-account backend.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new server with the default (logging) OTP sender.
    pub fn new(config: AppConfig) -> Self {
        Self::with_otp_sender(config, Arc::new(LogOtpSender))
    }

    /// Create a new server with an injected OTP delivery collaborator.
    pub fn with_otp_sender(config: AppConfig, sender: Arc<dyn OtpSender>) -> Self {
        let accounts = Arc::new(AccountStore::new());
        let sessions = Arc::new(SessionStore::new());
        let tokens = Arc::new(TokenService::new(
            &config.auth.token_secret,
            config.auth.token_ttl_secs,
        ));
        let ledger = Arc::new(LedgerService::new(accounts.clone()));
        let verifier = Arc::new(CredentialVerifier::new(
            accounts.clone(),
            sessions.clone(),
            tokens.clone(),
            OtpStore::new(config.auth.otp_ttl_secs),
            sender,
            config.auth.otp_policy,
        ));
        let lifecycle = Arc::new(AccountLifecycle::new(
            accounts.clone(),
            sessions.clone(),
            ledger.clone(),
        ));
        let limiters = RateLimiters::from_config(&config.rate_limit);

        let state = AppState {
            config: Arc::new(config),
            accounts,
            sessions,
            tokens,
            ledger,
            verifier,
            lifecycle,
            limiters,
        };

        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        // Login/registration surface: tightest ceiling, no credentials
        // required yet.
        let auth_surface = Router::new()
            .route("/api/auth/register", post(api::auth::register))
            .route("/api/auth/login", post(api::auth::login))
            .layer(middleware::from_fn_with_state(
                state.limiters.auth.clone(),
                rate_limit_middleware,
            ));

        // Credential-adjacent surface without the full gate.
        let auth_general = Router::new()
            .route("/api/auth/resend-login-otp", post(api::auth::resend_login_otp))
            .route("/api/auth/verify-email", post(api::auth::verify_email))
            .route("/api/auth/logout", post(api::auth::logout))
            .layer(middleware::from_fn_with_state(
                state.limiters.general.clone(),
                rate_limit_middleware,
            ));

        let me = Router::new()
            .route("/api/auth/me", get(api::auth::me))
            .layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .layer(middleware::from_fn_with_state(
                state.limiters.general.clone(),
                rate_limit_middleware,
            ));

        // Client reads and benign updates: full gate, general ceiling.
        let client_general = Router::new()
            .route("/api/client/transactions", get(api::client::transactions))
            .route("/api/client/balance", get(api::client::balance))
            .route("/api/client/device", put(api::client::update_device))
            .layer(middleware::from_fn(require_client))
            .layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .layer(middleware::from_fn_with_state(
                state.limiters.general.clone(),
                rate_limit_middleware,
            ));

        // Money movement and deletion: full gate, strict ceiling.
        let client_strict = Router::new()
            .route("/api/client/deposit", post(api::client::deposit))
            .route("/api/client/withdraw", post(api::client::withdraw))
            .route("/api/client/account", delete(api::client::delete_account))
            .layer(middleware::from_fn(require_client))
            .layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .layer(middleware::from_fn_with_state(
                state.limiters.strict.clone(),
                rate_limit_middleware,
            ));

        let mut router = Router::new()
            .route("/health", get(api::health))
            .merge(auth_surface)
            .merge(auth_general)
            .merge(me)
            .merge(client_general)
            .merge(client_strict);

        if state.config.dev.enable_rate_limit_reset {
            tracing::warn!("development rate-limit reset endpoint is enabled");
            router = router.route(
                "/api/dev/clear-rate-limits",
                post(api::dev::clear_rate_limits),
            );
        }

        router
            .fallback(api::not_found)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
            .layer(TraceLayer::new_for_http())
    }

    /// Shared state, mainly for tests and tooling.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
