//! Signup and email confirmation API integration tests

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderValue, StatusCode};
use chrono::Duration;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{test_settings, TestApp, STRONG_PASSWORD};
use rest_auth_toolkit::backend::mail::{MailError, Mailer, MemoryMailer, OutgoingMail};
use rest_auth_toolkit::backend::server::config::load_database;

#[tokio::test]
async fn test_signup_creates_inactive_user_and_mails_link() {
    let app = TestApp::new().await;

    let response = app.signup("ann@example.com", STRONG_PASSWORD).await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["email"], "ann@example.com");
    assert_eq!(body["is_active"], false);
    assert!(body["id"].is_string());
    assert!(body.get("password").is_none());

    let mail = app.mailer.last().unwrap();
    assert_eq!(mail.to, "ann@example.com");
    assert_eq!(mail.subject, "Confirm your email address on Demo");
    assert!(mail.body.contains("http://testserver/confirm-email/"));

    let user = app.user("ann@example.com").await.unwrap();
    assert!(!user.is_active);
    assert_ne!(user.password_hash, STRONG_PASSWORD);
}

#[tokio::test]
async fn test_signup_normalizes_email_domain() {
    let app = TestApp::new().await;

    let response = app.signup("Ann@Example.COM", STRONG_PASSWORD).await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["email"], "Ann@example.com");
}

#[tokio::test]
async fn test_signup_requires_fields() {
    let app = TestApp::new().await;

    let response = app.server.post("/api/auth/signup").json(&json!({})).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({
            "email": ["This field is required."],
            "password": ["This field is required."],
        })
    );
}

#[tokio::test]
async fn test_signup_rejects_invalid_email() {
    let app = TestApp::new().await;

    let response = app.signup("not-an-email", STRONG_PASSWORD).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({ "email": ["Enter a valid email address."] })
    );
}

#[tokio::test]
async fn test_weak_password_reports_every_message() {
    let app = TestApp::new().await;

    let response = app.signup("ann@example.com", "1234").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({
            "password": [
                "This password is too short. It must contain at least 8 characters.",
                "This password is too common.",
                "This password is entirely numeric.",
            ]
        })
    );
    assert!(app.user("ann@example.com").await.is_none());
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_password_similar_to_email_is_rejected() {
    let app = TestApp::new().await;

    let response = app.signup("ann.lee@example.com", "annlee@example").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({ "password": ["The password is too similar to the email address."] })
    );
}

#[tokio::test]
async fn test_minimum_length_is_configurable() {
    let app = TestApp::with_settings(test_settings().password_min_length(20).build().unwrap()).await;

    let response = app.signup("ann@example.com", STRONG_PASSWORD).await;

    assert_eq!(
        response.json::<Value>(),
        json!({ "password": ["This password is too short. It must contain at least 20 characters."] })
    );
}

#[tokio::test]
async fn test_validation_messages_follow_accept_language() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/auth/signup")
        .add_header(header::ACCEPT_LANGUAGE, HeaderValue::from_static("fr-FR,fr;q=0.9,en;q=0.5"))
        .json(&json!({ "email": "ann", "password": "" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({
            "email": ["Saisissez une adresse e-mail valide."],
            "password": ["Ce champ est obligatoire."],
        })
    );
}

#[tokio::test]
async fn test_signup_rejects_active_email() {
    let app = TestApp::new().await;
    app.register_and_confirm("ann@example.com", STRONG_PASSWORD).await;

    let response = app.signup("ann@example.com", "another-strong-phrase").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({ "email": ["A user with that email address already exists."] })
    );
}

#[tokio::test]
async fn test_signup_rejects_email_with_live_confirmation() {
    let app = TestApp::new().await;
    app.signup("ann@example.com", STRONG_PASSWORD).await;

    let response = app.signup("ann@example.com", STRONG_PASSWORD).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(app.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_lapsed_signup_can_register_again() {
    let app = TestApp::new().await;
    let (user, old_token) = app.pending_user("ann@example.com", Duration::days(8)).await;

    let response = app.signup("ann@example.com", "a-brand-new-phrase").await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["id"], user.id.to_string());

    let new_token = app.last_confirmation_token();
    assert_ne!(new_token, old_token);

    let response = app.confirm("ann@example.com", &new_token).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app.login("ann@example.com", "a-brand-new-phrase").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_taken_email_is_reported_before_password_policy() {
    let app = TestApp::new().await;
    app.register_and_confirm("ann@example.com", STRONG_PASSWORD).await;

    let response = app.signup("ann@example.com", "1234").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({ "email": ["A user with that email address already exists."] })
    );
}

struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _mail: OutgoingMail) -> Result<(), MailError> {
        let error = "no at sign".parse::<lettre::Address>().unwrap_err();
        Err(MailError::Address(error))
    }
}

#[tokio::test]
async fn test_mail_failure_rolls_back_signup() {
    let settings = test_settings().build().unwrap();
    let app = TestApp::with_mailer(settings, MemoryMailer::new(), Arc::new(FailingMailer)).await;

    let response = app.signup("ann@example.com", STRONG_PASSWORD).await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.json::<Value>()["error"], "Failed to send confirmation email");
    assert!(app.user("ann@example.com").await.is_none());
}

#[tokio::test]
async fn test_mail_failure_restores_lapsed_account() {
    let settings = test_settings().build().unwrap();
    let app = TestApp::with_mailer(settings, MemoryMailer::new(), Arc::new(FailingMailer)).await;
    let (user, _) = app.pending_user("ann@example.com", Duration::days(8)).await;

    let response = app.signup("ann@example.com", "a-brand-new-phrase").await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let restored = app.user("ann@example.com").await.unwrap();
    assert_eq!(restored.id, user.id);
    assert_eq!(restored.password_hash, user.password_hash);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM email_confirmations WHERE user_id = ?")
        .bind(user.id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

/// Holds every mail for a while before delivering it
struct SlowMailer {
    outbox: MemoryMailer,
    started: Arc<tokio::sync::Notify>,
    delivered: Arc<AtomicBool>,
}

#[async_trait]
impl Mailer for SlowMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.started.notify_one();
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        self.delivered.store(true, Ordering::SeqCst);
        self.outbox.send(mail).await
    }
}

#[tokio::test]
async fn test_slow_mail_does_not_block_other_writes() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings()
        .database_url(format!("sqlite://{}", dir.path().join("auth.db").display()))
        .build()
        .unwrap();
    let pool = load_database(&settings).await.unwrap();

    let outbox = MemoryMailer::new();
    let started = Arc::new(tokio::sync::Notify::new());
    let delivered = Arc::new(AtomicBool::new(false));
    let mailer = SlowMailer {
        outbox: outbox.clone(),
        started: started.clone(),
        delivered: delivered.clone(),
    };
    let app = TestApp::with_pool(pool, settings, outbox, Arc::new(mailer));
    let (_, bob_token) = app.pending_user("bob@example.com", Duration::hours(1)).await;

    let (signup, (confirm, delivered_before_confirm)) = tokio::join!(
        app.signup("ann@example.com", STRONG_PASSWORD),
        async {
            started.notified().await;
            let response = app.confirm("bob@example.com", &bob_token).await;
            (response, delivered.load(Ordering::SeqCst))
        }
    );

    assert_eq!(confirm.status_code(), StatusCode::OK, "{}", confirm.text());
    assert!(!delivered_before_confirm);
    assert_eq!(signup.status_code(), StatusCode::CREATED);
    assert!(app.user("bob@example.com").await.unwrap().is_active);
    assert_eq!(app.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_confirm_api_activates_and_logs_in() {
    let app = TestApp::new().await;
    app.signup("ann@example.com", STRONG_PASSWORD).await;
    let token = app.last_confirmation_token();

    let response = app.confirm("ann@example.com", &token).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["user"]["email"], "ann@example.com");
    assert_eq!(body["user"]["is_active"], true);

    let session = body["token"].as_str().unwrap();
    let response = app.me(session).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["email"], "ann@example.com");
}

#[tokio::test]
async fn test_confirm_api_token_is_single_use() {
    let app = TestApp::new().await;
    app.signup("ann@example.com", STRONG_PASSWORD).await;
    let token = app.last_confirmation_token();
    app.confirm("ann@example.com", &token).await;

    let response = app.confirm("ann@example.com", &token).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({ "errors": ["Invalid link"] }));
}

#[tokio::test]
async fn test_confirm_api_requires_matching_email() {
    let app = TestApp::new().await;
    app.signup("ann@example.com", STRONG_PASSWORD).await;
    let token = app.last_confirmation_token();

    let response = app.confirm("bob@example.com", &token).await;

    assert_eq!(response.json::<Value>(), json!({ "errors": ["Invalid link"] }));
    assert!(!app.user("ann@example.com").await.unwrap().is_active);
}

#[tokio::test]
async fn test_confirm_api_expired_token() {
    let app = TestApp::new().await;
    let (_, token) = app.pending_user("ann@example.com", Duration::days(8)).await;

    let response = app.confirm("ann@example.com", &token).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({ "errors": ["Email expired, please register again"] })
    );
}

#[tokio::test]
async fn test_confirm_api_validates_fields() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/auth/confirm-email")
        .json(&json!({ "email": "ann" }))
        .await;

    assert_eq!(
        response.json::<Value>(),
        json!({
            "email": ["Enter a valid email address."],
            "token": ["This field is required."],
        })
    );
}
