//! Integration tests for the two-factor login flow.

mod common;

use common::{client, relaxed_config, spawn_server};
use savings_backend::config::OtpPolicy;

fn otp_config() -> savings_backend::config::AppConfig {
    let mut config = relaxed_config();
    config.auth.otp_policy = OtpPolicy::UnverifiedOnly;
    config
}

async fn register(ts: &common::TestServer, email: &str) {
    let res = client()
        .post(ts.url("/api/auth/register"))
        .json(&serde_json::json!({
            "name": "Test User",
            "email": email,
            "password": "a-strong-password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
}

#[tokio::test]
async fn test_unverified_login_requires_otp() {
    let ts = spawn_server(otp_config()).await;
    let client = client();
    register(&ts, "second@example.com").await;

    // First attempt: password accepted, code demanded and dispatched.
    let res = client
        .post(ts.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": "second@example.com",
            "password": "a-strong-password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().to_lowercase().contains("otp"));

    let code = ts.otp.last_code();

    // Wrong code: rejected, generic message.
    let res = client
        .post(ts.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": "second@example.com",
            "password": "a-strong-password",
            "otp": "000000",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    // Right code: fully authenticated.
    let res = client
        .post(ts.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": "second@example.com",
            "password": "a-strong-password",
            "otp": code,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["token"].as_str().is_some());
    assert!(body["sessionId"].as_str().is_some());
    assert_eq!(body["user"]["email"], "second@example.com");

    ts.shutdown.trigger();
}

#[tokio::test]
async fn test_resend_invalidates_previous_code() {
    let ts = spawn_server(otp_config()).await;
    let client = client();
    register(&ts, "resend@example.com").await;

    client
        .post(ts.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": "resend@example.com",
            "password": "a-strong-password",
        }))
        .send()
        .await
        .unwrap();
    let old_code = ts.otp.last_code();

    let res = client
        .post(ts.url("/api/auth/resend-login-otp"))
        .json(&serde_json::json!({"email": "resend@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let new_code = ts.otp.last_code();
    assert_ne!(old_code, new_code);

    // The displaced code is dead.
    let res = client
        .post(ts.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": "resend@example.com",
            "password": "a-strong-password",
            "otp": old_code,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .post(ts.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": "resend@example.com",
            "password": "a-strong-password",
            "otp": new_code,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    ts.shutdown.trigger();
}

#[tokio::test]
async fn test_resend_is_enumeration_resistant() {
    let ts = spawn_server(otp_config()).await;
    let client = client();
    register(&ts, "real@example.com").await;

    let for_real = client
        .post(ts.url("/api/auth/resend-login-otp"))
        .json(&serde_json::json!({"email": "real@example.com"}))
        .send()
        .await
        .unwrap();
    let for_ghost = client
        .post(ts.url("/api/auth/resend-login-otp"))
        .json(&serde_json::json!({"email": "ghost@example.com"}))
        .send()
        .await
        .unwrap();

    assert_eq!(for_real.status(), 200);
    assert_eq!(for_ghost.status(), 200);

    let real_body: serde_json::Value = for_real.json().await.unwrap();
    let ghost_body: serde_json::Value = for_ghost.json().await.unwrap();
    assert_eq!(real_body["message"], ghost_body["message"]);

    ts.shutdown.trigger();
}

#[tokio::test]
async fn test_verify_email_lifts_second_factor() {
    let ts = spawn_server(otp_config()).await;
    let client = client();
    register(&ts, "verify@example.com").await;

    // Trigger a code, then spend it on verification.
    client
        .post(ts.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": "verify@example.com",
            "password": "a-strong-password",
        }))
        .send()
        .await
        .unwrap();
    let code = ts.otp.last_code();

    let res = client
        .post(ts.url("/api/auth/verify-email"))
        .json(&serde_json::json!({
            "email": "verify@example.com",
            "otp": code,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    // Verified account under unverified-only policy: password suffices.
    let res = client
        .post(ts.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": "verify@example.com",
            "password": "a-strong-password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["isVerified"], true);

    ts.shutdown.trigger();
}

#[tokio::test]
async fn test_login_failures_share_one_message() {
    let ts = spawn_server(otp_config()).await;
    let client = client();
    register(&ts, "generic@example.com").await;

    let unknown = client
        .post(ts.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": "nobody@example.com",
            "password": "a-strong-password",
        }))
        .send()
        .await
        .unwrap();
    let wrong_password = client
        .post(ts.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": "generic@example.com",
            "password": "not-the-password",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(unknown.status(), 401);
    assert_eq!(wrong_password.status(), 401);

    let unknown_body: serde_json::Value = unknown.json().await.unwrap();
    let wrong_body: serde_json::Value = wrong_password.json().await.unwrap();
    assert_eq!(unknown_body["message"], wrong_body["message"]);

    ts.shutdown.trigger();
}
