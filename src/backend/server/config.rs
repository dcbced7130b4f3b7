/**
 * Server Configuration
 *
 * This module loads the settings and opens the SQLite database the server
 * runs against.
 *
 * # Configuration Sources
 *
 * Settings are read from environment variables, after `.env` has been
 * loaded with `dotenv`. Every variable except `JWT_SECRET` (in release
 * builds) has a default suitable for local development.
 *
 * # Error Handling
 *
 * Unlike optional services, the database is required: a connection or
 * migration failure aborts startup with an [`InitError`].
 */

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::backend::server::init::InitError;
use crate::shared::Settings;

/// Copy `.env` into the process environment; variables already set win
pub fn load_env_file() {
    dotenv::dotenv().ok();
}

/// Install the global fmt subscriber, filtered by `RUST_LOG` (default `info`)
///
/// Runs before settings are read so their warnings are not lost.
pub fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();
}

/// Load settings from `.env` and the process environment
pub fn load_settings() -> Result<Settings, InitError> {
    load_env_file();
    Ok(Settings::from_env()?)
}

/// Open the database pool and run migrations
///
/// The database file is created when it does not exist yet.
pub async fn load_database(settings: &Settings) -> Result<SqlitePool, InitError> {
    tracing::info!("Connecting to database...");

    let options = SqliteConnectOptions::from_str(&settings.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    tracing::info!("Database connection pool created successfully");
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Fresh in-memory database with the schema applied
///
/// Each connection to `sqlite::memory:` is its own database, so the pool is
/// held to a single connection that is never recycled.
pub async fn connect_memory_database() -> Result<SqlitePool, InitError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), InitError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!().run(pool).await?;
    tracing::info!("Database migrations completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_settings_warnings_reach_the_subscriber() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let settings = tracing::subscriber::with_default(subscriber, || {
            Settings::from_lookup(|_| None)
        });

        assert!(settings.is_ok());
        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("JWT_SECRET not set"), "{output}");
    }

    #[tokio::test]
    async fn test_memory_database_has_schema() {
        let pool = connect_memory_database().await.unwrap();
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|(name,)| name.as_str()).collect();
        assert!(names.contains(&"users"));
        assert!(names.contains(&"email_confirmations"));
    }

    #[tokio::test]
    async fn test_load_database_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.db");
        let settings = Settings::builder()
            .database_url(format!("sqlite://{}", path.display()))
            .build()
            .unwrap();

        let pool = load_database(&settings).await.unwrap();
        pool.close().await;
        assert!(path.exists());
    }
}
