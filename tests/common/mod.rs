//! Common test utilities and helpers
//!
//! Every integration test builds its own application around a fresh
//! in-memory database and an in-memory mail transport, so tests never share
//! state.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use rest_auth_toolkit::backend::auth::confirmations::create_confirmation_at;
use rest_auth_toolkit::backend::auth::users::{create_user, get_user_by_email, NewUser, User};
use rest_auth_toolkit::backend::mail::{Mailer, MemoryMailer};
use rest_auth_toolkit::backend::server::config::connect_memory_database;
use rest_auth_toolkit::backend::server::create_app_with;
use rest_auth_toolkit::shared::{Settings, SettingsBuilder};

pub const STRONG_PASSWORD: &str = "tangerine-otter-42";

/// Settings for tests: cheap bcrypt and a fixed site URL
pub fn test_settings() -> SettingsBuilder {
    Settings::builder()
        .site_name("Demo")
        .site_url("http://testserver")
        .jwt_secret("integration-test-secret")
        .bcrypt_cost(4)
}

/// Running application plus handles on its database and outbox
pub struct TestApp {
    pub server: TestServer,
    pub pool: SqlitePool,
    pub mailer: MemoryMailer,
    pub settings: Settings,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(test_settings().build().unwrap()).await
    }

    pub async fn with_settings(settings: Settings) -> Self {
        let mailer = MemoryMailer::new();
        Self::with_mailer(settings, mailer.clone(), Arc::new(mailer)).await
    }

    pub async fn with_mailer(settings: Settings, outbox: MemoryMailer, mailer: Arc<dyn Mailer>) -> Self {
        let pool = connect_memory_database().await.unwrap();
        Self::with_pool(pool, settings, outbox, mailer)
    }

    /// Application over an already opened database
    pub fn with_pool(
        pool: SqlitePool,
        settings: Settings,
        outbox: MemoryMailer,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let app = create_app_with(pool.clone(), settings.clone(), mailer);
        let server = TestServer::new(app).unwrap();

        Self {
            server,
            pool,
            mailer: outbox,
            settings,
        }
    }

    pub async fn signup(&self, email: &str, password: &str) -> TestResponse {
        self.server
            .post("/api/auth/signup")
            .json(&json!({ "email": email, "password": password }))
            .await
    }

    pub async fn confirm(&self, email: &str, token: &str) -> TestResponse {
        self.server
            .post("/api/auth/confirm-email")
            .json(&json!({ "email": email, "token": token }))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.server
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .await
    }

    pub async fn me(&self, session_token: &str) -> TestResponse {
        self.server
            .get("/api/auth/me")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {session_token}")).unwrap(),
            )
            .await
    }

    /// Token from the link in the most recent mail
    pub fn last_confirmation_token(&self) -> String {
        let mail = self.mailer.last().expect("no mail was sent");
        confirmation_token(&mail.body)
    }

    /// Sign up, follow the mailed link through the API, return the session token
    pub async fn register_and_confirm(&self, email: &str, password: &str) -> String {
        let response = self.signup(email, password).await;
        assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.text());

        let token = self.last_confirmation_token();
        let response = self.confirm(email, &token).await;
        assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
        response.json::<Value>()["token"].as_str().unwrap().to_string()
    }

    /// Inactive user whose only confirmation was issued `age` ago
    pub async fn pending_user(&self, email: &str, age: Duration) -> (User, String) {
        let hash = bcrypt::hash(STRONG_PASSWORD, 4).unwrap();
        let user = create_user(&self.pool, NewUser::inactive(email, hash)).await.unwrap();
        let confirmation = create_confirmation_at(&self.pool, user.id, Utc::now() - age)
            .await
            .unwrap();
        (user, confirmation.external_id.to_string())
    }

    pub async fn user(&self, email: &str) -> Option<User> {
        get_user_by_email(&self.pool, email).await.unwrap()
    }
}

/// Extract the token from a `/confirm-email/{token}` link in a mail body
pub fn confirmation_token(body: &str) -> String {
    let start = body.find("/confirm-email/").expect("mail has no confirmation link") + "/confirm-email/".len();
    body[start..]
        .split_whitespace()
        .next()
        .unwrap()
        .to_string()
}
