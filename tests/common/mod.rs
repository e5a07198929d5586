//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;

use savings_backend::auth::{DeliveryError, OtpSender};
use savings_backend::config::{AppConfig, OtpPolicy};
use savings_backend::http::{AppState, HttpServer};
use savings_backend::lifecycle::Shutdown;

/// Records every dispatched one-time code so tests can read them back.
#[derive(Default)]
pub struct RecordingOtpSender {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl OtpSender for RecordingOtpSender {
    async fn send_otp(&self, email: &str, code: &str) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}

impl RecordingOtpSender {
    #[allow(dead_code)]
    pub fn last_code(&self) -> String {
        self.sent
            .lock()
            .unwrap()
            .last()
            .expect("no one-time code was sent")
            .1
            .clone()
    }
}

/// A running backend bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    pub otp: Arc<RecordingOtpSender>,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the real server on an ephemeral port.
pub async fn spawn_server(config: AppConfig) -> TestServer {
    let otp = Arc::new(RecordingOtpSender::default());
    let server = HttpServer::with_otp_sender(config, otp.clone());
    let state = server.state();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Give the accept loop a beat.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        state,
        otp,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Roomy limits and no second factor, for flows that are about neither.
#[allow(dead_code)]
pub fn relaxed_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.otp_policy = OtpPolicy::Never;
    config.rate_limit.auth.max_requests = 10_000;
    config.rate_limit.general.max_requests = 10_000;
    config.rate_limit.strict.max_requests = 10_000;
    config
}

/// Register an account and complete a password-only login, returning
/// `(token, session_id)`. Requires `OtpPolicy::Never`.
#[allow(dead_code)]
pub async fn register_and_login(ts: &TestServer, email: &str) -> (String, String) {
    let client = client();

    let res = client
        .post(ts.url("/api/auth/register"))
        .json(&serde_json::json!({
            "name": "Test User",
            "email": email,
            "password": "a-strong-password",
            "deviceId": "device-1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201, "registration failed");

    let res = client
        .post(ts.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": email,
            "password": "a-strong-password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200, "login failed");

    let body: serde_json::Value = res.json().await.unwrap();
    (
        body["token"].as_str().unwrap().to_string(),
        body["sessionId"].as_str().unwrap().to_string(),
    )
}
