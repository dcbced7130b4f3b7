/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including database loading, mail transport selection, and route
 * configuration.
 *
 * # Initialization Process
 *
 * 1. Open the database and run migrations
 * 2. Build the mail transport from the SMTP settings
 * 3. Create the application state
 * 4. Create and configure the router
 */

use std::sync::Arc;

use axum::Router;
use thiserror::Error;

use crate::backend::mail::{mailer_from_settings, MailError, Mailer};
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_database;
use crate::backend::server::state::AppState;
use crate::shared::{ConfigError, Settings};

/// Startup failures
#[derive(Debug, Error)]
pub enum InitError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("mail transport error: {0}")]
    Mail(#[from] MailError),
}

/// Create and configure the Axum application
///
/// Opens the database named by `DATABASE_URL` and picks the mail transport
/// from the SMTP settings.
pub async fn create_app(settings: Settings) -> Result<Router, InitError> {
    tracing::info!("Initializing {} backend server", settings.site_name);

    let db_pool = load_database(&settings).await?;
    let mailer = mailer_from_settings(&settings)?;

    Ok(create_app_with(db_pool, settings, mailer))
}

/// Create the application around an existing pool and mail transport
pub fn create_app_with(
    db_pool: sqlx::SqlitePool,
    settings: Settings,
    mailer: Arc<dyn Mailer>,
) -> Router {
    if settings.facebook().is_none() {
        tracing::warn!("FACEBOOK_APP_ID or FACEBOOK_APP_SECRET_KEY not set. Facebook login is disabled.");
    }

    let app_state = AppState::new(db_pool, settings, mailer);
    let app = create_router(app_state);

    tracing::info!("Router configured");
    app
}
