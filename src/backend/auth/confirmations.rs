/**
 * Email Confirmations
 *
 * A confirmation row is created for every signup and mailed to the user as
 * a link carrying its `external_id`. Following the link consumes the row and
 * activates the user. Tokens are single-use and expire after the configured
 * lifetime.
 *
 * # Confirmation Outcomes
 *
 * - unknown, malformed or already consumed token - `ConfirmationError::NotFound`
 * - token older than the lifetime - `ConfirmationError::Expired`
 * - otherwise the row is consumed and the activated user returned
 */

use chrono::{DateTime, Duration, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use crate::backend::auth::users::{activate_user, User};

/// Pending or consumed email confirmation
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmailConfirmation {
    pub id: i64,
    /// Token mailed to the user
    pub external_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Set once the link has been followed
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl EmailConfirmation {
    /// Saturates at the last representable instant
    pub fn expires_at(&self, lifetime: Duration) -> DateTime<Utc> {
        self.created_at
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, lifetime: Duration, now: DateTime<Utc>) -> bool {
        now > self.expires_at(lifetime)
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }
}

/// Confirmation failures
#[derive(Debug, Error)]
pub enum ConfirmationError {
    #[error("email confirmation does not exist")]
    NotFound,
    #[error("email confirmation is expired")]
    Expired,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// How the confirmation to consume is identified
#[derive(Debug, Clone, Copy)]
pub enum ConfirmationLookup<'a> {
    /// Landing page links only carry the token
    Token(&'a str),
    /// The JSON API also requires the matching email address
    TokenAndEmail { token: &'a str, email: &'a str },
}

impl<'a> ConfirmationLookup<'a> {
    fn token(&self) -> &'a str {
        match self {
            Self::Token(token) | Self::TokenAndEmail { token, .. } => *token,
        }
    }
}

/// Create a confirmation for `user_id`, timestamped now
pub async fn create_confirmation<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<EmailConfirmation, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    create_confirmation_at(executor, user_id, Utc::now()).await
}

/// Create a confirmation with an explicit creation time
pub async fn create_confirmation_at<'e, E>(
    executor: E,
    user_id: Uuid,
    created_at: DateTime<Utc>,
) -> Result<EmailConfirmation, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, EmailConfirmation>(
        r#"
        INSERT INTO email_confirmations (external_id, user_id, created_at)
        VALUES (?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(created_at)
    .fetch_one(executor)
    .await
}

/// All confirmations issued to a user, newest first
pub async fn list_confirmations<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Vec<EmailConfirmation>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, EmailConfirmation>(
        "SELECT * FROM email_confirmations WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Mark every unused confirmation of a user as consumed
pub async fn consume_pending_confirmations<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE email_confirmations SET confirmed_at = ? WHERE user_id = ? AND confirmed_at IS NULL",
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Delete a single confirmation
pub async fn delete_confirmation<'e, E>(executor: E, id: i64) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM email_confirmations WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Whether an existing account may be registered again
///
/// Only inactive password accounts whose confirmations all lapsed unused
/// qualify. Anything confirmed, linked to Facebook, or still waiting on a
/// live link keeps the address taken.
pub fn can_register_again(
    user: &User,
    confirmations: &[EmailConfirmation],
    lifetime: Duration,
    now: DateTime<Utc>,
) -> bool {
    !user.is_active
        && user.facebook_id.is_none()
        && confirmations
            .iter()
            .all(|confirmation| !confirmation.is_confirmed() && confirmation.is_expired(lifetime, now))
}

/// Consume a confirmation and activate its user
pub async fn confirm_email(
    pool: &SqlitePool,
    lookup: ConfirmationLookup<'_>,
    lifetime: Duration,
) -> Result<User, ConfirmationError> {
    let external_id =
        Uuid::parse_str(lookup.token().trim()).map_err(|_| ConfirmationError::NotFound)?;

    // Takes the write lock up front so a busy database is waited on
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    let confirmation = match lookup {
        ConfirmationLookup::Token(_) => {
            sqlx::query_as::<_, EmailConfirmation>(
                r#"
                SELECT * FROM email_confirmations
                WHERE external_id = ? AND confirmed_at IS NULL
                "#,
            )
            .bind(external_id)
            .fetch_optional(&mut *tx)
            .await?
        }
        ConfirmationLookup::TokenAndEmail { email, .. } => {
            sqlx::query_as::<_, EmailConfirmation>(
                r#"
                SELECT c.* FROM email_confirmations c
                JOIN users u ON u.id = c.user_id
                WHERE c.external_id = ? AND c.confirmed_at IS NULL AND u.email = ?
                "#,
            )
            .bind(external_id)
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?
        }
    };

    let confirmation = confirmation.ok_or(ConfirmationError::NotFound)?;

    let now = Utc::now();
    if confirmation.is_expired(lifetime, now) {
        tracing::info!(
            "Confirmation {} for user {} expired at {}",
            confirmation.id,
            confirmation.user_id,
            confirmation.expires_at(lifetime)
        );
        return Err(ConfirmationError::Expired);
    }

    sqlx::query("UPDATE email_confirmations SET confirmed_at = ? WHERE id = ?")
        .bind(now)
        .bind(confirmation.id)
        .execute(&mut *tx)
        .await?;
    let user = activate_user(&mut *tx, confirmation.user_id).await?;

    tx.commit().await?;
    tracing::info!("Email confirmed for user {} ({})", user.id, user.email);

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::auth::users::{create_user, NewUser};
    use crate::backend::server::config::connect_memory_database;
    use assert_matches::assert_matches;

    fn lifetime() -> Duration {
        Duration::days(7)
    }

    async fn pending_user(pool: &SqlitePool, email: &str) -> User {
        create_user(pool, NewUser::inactive(email, "hash")).await.unwrap()
    }

    #[tokio::test]
    async fn test_confirm_activates_user() {
        let pool = connect_memory_database().await.unwrap();
        let user = pending_user(&pool, "ann@example.com").await;
        let confirmation = create_confirmation(&pool, user.id).await.unwrap();

        let token = confirmation.external_id.to_string();
        let confirmed = confirm_email(&pool, ConfirmationLookup::Token(&token), lifetime())
            .await
            .unwrap();

        assert_eq!(confirmed.id, user.id);
        assert!(confirmed.is_active);
    }

    #[tokio::test]
    async fn test_token_is_single_use() {
        let pool = connect_memory_database().await.unwrap();
        let user = pending_user(&pool, "ann@example.com").await;
        let token = create_confirmation(&pool, user.id)
            .await
            .unwrap()
            .external_id
            .to_string();

        confirm_email(&pool, ConfirmationLookup::Token(&token), lifetime())
            .await
            .unwrap();
        let second = confirm_email(&pool, ConfirmationLookup::Token(&token), lifetime()).await;
        assert_matches!(second, Err(ConfirmationError::NotFound));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let pool = connect_memory_database().await.unwrap();
        let user = pending_user(&pool, "ann@example.com").await;
        let created_at = Utc::now() - Duration::days(8);
        let token = create_confirmation_at(&pool, user.id, created_at)
            .await
            .unwrap()
            .external_id
            .to_string();

        let result = confirm_email(&pool, ConfirmationLookup::Token(&token), lifetime()).await;
        assert_matches!(result, Err(ConfirmationError::Expired));

        // The user stays inactive.
        let user = crate::backend::auth::users::get_user_by_id(&pool, user.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!user.is_active);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_tokens() {
        let pool = connect_memory_database().await.unwrap();
        let unknown = Uuid::new_v4().to_string();

        let result = confirm_email(&pool, ConfirmationLookup::Token(&unknown), lifetime()).await;
        assert_matches!(result, Err(ConfirmationError::NotFound));

        let result = confirm_email(&pool, ConfirmationLookup::Token("not-a-token"), lifetime()).await;
        assert_matches!(result, Err(ConfirmationError::NotFound));
    }

    #[tokio::test]
    async fn test_email_must_match() {
        let pool = connect_memory_database().await.unwrap();
        let user = pending_user(&pool, "ann@example.com").await;
        let token = create_confirmation(&pool, user.id)
            .await
            .unwrap()
            .external_id
            .to_string();

        let wrong = ConfirmationLookup::TokenAndEmail {
            token: &token,
            email: "bob@example.com",
        };
        assert_matches!(
            confirm_email(&pool, wrong, lifetime()).await,
            Err(ConfirmationError::NotFound)
        );

        let right = ConfirmationLookup::TokenAndEmail {
            token: &token,
            email: "ann@example.com",
        };
        assert!(confirm_email(&pool, right, lifetime()).await.is_ok());
    }

    #[tokio::test]
    async fn test_huge_lifetime_never_expires() {
        let pool = connect_memory_database().await.unwrap();
        let user = pending_user(&pool, "ann@example.com").await;
        let confirmation = create_confirmation(&pool, user.id).await.unwrap();
        let lifetime = Duration::days(100_000_000);

        assert_eq!(confirmation.expires_at(lifetime), DateTime::<Utc>::MAX_UTC);
        assert!(!confirmation.is_expired(lifetime, Utc::now()));
    }

    #[tokio::test]
    async fn test_can_register_again() {
        let pool = connect_memory_database().await.unwrap();
        let user = pending_user(&pool, "ann@example.com").await;
        let now = Utc::now();

        assert!(can_register_again(&user, &[], lifetime(), now));

        create_confirmation_at(&pool, user.id, now - Duration::days(10))
            .await
            .unwrap();
        let lapsed = list_confirmations(&pool, user.id).await.unwrap();
        assert!(can_register_again(&user, &lapsed, lifetime(), now));

        create_confirmation(&pool, user.id).await.unwrap();
        let pending = list_confirmations(&pool, user.id).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(!can_register_again(&user, &pending, lifetime(), now));
    }
}
