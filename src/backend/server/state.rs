/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct holds everything handlers share:
 * - the SQLite connection pool
 * - immutable settings loaded at startup
 * - session token keys and the password policy derived from them
 * - the mail transport
 * - the Facebook Graph client, when an app is configured
 *
 * # Thread Safety
 *
 * Nothing in the state is mutated after startup. The pool synchronises
 * itself and every other field sits behind an `Arc`.
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::backend::auth::facebook::{graph_http_client, FacebookClient, GRAPH_TIMEOUT};
use crate::backend::auth::password_validation::PasswordPolicy;
use crate::backend::auth::sessions::SessionKeys;
use crate::backend::mail::Mailer;
use crate::shared::Settings;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db_pool: SqlitePool,

    /// Settings loaded at startup
    pub settings: Arc<Settings>,

    /// Keys used to issue and verify session tokens
    pub sessions: Arc<SessionKeys>,

    /// Validators run on signup
    pub password_policy: Arc<PasswordPolicy>,

    /// Transport for confirmation mails
    pub mailer: Arc<dyn Mailer>,

    /// Graph API client
    ///
    /// This is `None` if `FACEBOOK_APP_ID` or `FACEBOOK_APP_SECRET_KEY` is
    /// not set, in which case Facebook login answers 503.
    pub facebook: Option<FacebookClient>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, settings: Settings, mailer: Arc<dyn Mailer>) -> Self {
        let sessions = SessionKeys::new(&settings.jwt_secret, settings.session_lifetime);
        let password_policy = PasswordPolicy::default_for(settings.password_min_length);
        let facebook = settings.facebook().and_then(|app| {
            match graph_http_client(GRAPH_TIMEOUT) {
                Ok(http) => Some(FacebookClient::new(http, &settings.facebook_graph_url, app)),
                Err(e) => {
                    tracing::error!("Failed to build the Graph API client: {:?}", e);
                    None
                }
            }
        });

        Self {
            db_pool,
            settings: Arc::new(settings),
            sessions: Arc::new(sessions),
            password_policy: Arc::new(password_policy),
            mailer,
            facebook,
        }
    }
}

/// Lets handlers extract the pool with `State(pool): State<SqlitePool>`
impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

impl FromRef<AppState> for Arc<Settings> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.settings.clone()
    }
}

impl FromRef<AppState> for Arc<SessionKeys> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sessions.clone()
    }
}
