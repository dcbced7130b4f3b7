//! Database setup tests against a file-backed SQLite database

use pretty_assertions::assert_eq;

use rest_auth_toolkit::backend::auth::users::{create_user, get_user_by_email, NewUser};
use rest_auth_toolkit::backend::server::config::load_database;
use rest_auth_toolkit::shared::Settings;

fn settings_for(dir: &tempfile::TempDir) -> Settings {
    Settings::builder()
        .database_url(format!("sqlite://{}", dir.path().join("auth.db").display()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_reopening_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_for(&dir);

    let pool = load_database(&settings).await.unwrap();
    create_user(&pool, NewUser::inactive("ann@example.com", "hash"))
        .await
        .unwrap();
    pool.close().await;

    // Migrations run again on startup and must be a no-op.
    let pool = load_database(&settings).await.unwrap();
    let user = get_user_by_email(&pool, "ann@example.com").await.unwrap();
    assert_eq!(user.map(|user| user.email), Some("ann@example.com".to_string()));
}

#[tokio::test]
async fn test_email_is_unique() {
    let dir = tempfile::tempdir().unwrap();
    let pool = load_database(&settings_for(&dir)).await.unwrap();

    create_user(&pool, NewUser::inactive("ann@example.com", "hash"))
        .await
        .unwrap();
    let duplicate = create_user(&pool, NewUser::inactive("ann@example.com", "hash")).await;

    match duplicate {
        Err(sqlx::Error::Database(e)) => assert!(e.is_unique_violation()),
        other => panic!("expected a unique violation, got {:?}", other.map(|user| user.id)),
    }
}

#[tokio::test]
async fn test_deleting_user_removes_confirmations() {
    let dir = tempfile::tempdir().unwrap();
    let pool = load_database(&settings_for(&dir)).await.unwrap();
    let user = create_user(&pool, NewUser::inactive("ann@example.com", "hash"))
        .await
        .unwrap();
    rest_auth_toolkit::backend::auth::confirmations::create_confirmation(&pool, user.id)
        .await
        .unwrap();

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM email_confirmations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}
