/**
 * User Model and Database Operations
 *
 * Users are created inactive by signup and activated by email confirmation.
 * Facebook login creates (or links) active users whose password is
 * unusable: a stored hash starting with `!` never verifies.
 *
 * Query functions accept any SQLite executor so they work both on the pool
 * and inside a transaction (`&mut *tx`).
 */

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use crate::backend::auth::confirmations::consume_pending_confirmations;

/// Prefix marking a password hash that can never match
const UNUSABLE_PASSWORD_PREFIX: char = '!';

/// User struct representing a user in the database
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID)
    pub id: Uuid,
    /// User email address (unique)
    pub email: String,
    /// Hashed password (bcrypt) or unusable marker
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// False until the email address is confirmed
    pub is_active: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Facebook user id, set once the account is linked
    pub facebook_id: Option<String>,
    /// Long-lived Facebook access token
    #[serde(skip_serializing)]
    pub facebook_access_token: Option<String>,
    pub facebook_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_usable_password(&self) -> bool {
        has_usable_password(&self.password_hash)
    }
}

/// Values for a new user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub facebook: Option<FacebookLink>,
}

impl NewUser {
    /// Inactive password user, as created by signup
    pub fn inactive(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            is_active: false,
            facebook: None,
        }
    }
}

/// Facebook account data stored on the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacebookLink {
    pub facebook_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub access_token: String,
    pub token_expires_at: Option<DateTime<Utc>>,
}

/// Lowercase the domain part of an email address
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Basic email address syntax check
///
/// Accepts a dot-atom local part and a domain of at least two labels (or
/// `localhost`). Quoted local parts and IP literals are rejected.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~-.".contains(c));
    if !local_ok {
        return false;
    }

    if domain.eq_ignore_ascii_case("localhost") {
        return true;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || domain.len() > 253 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));

    labels_ok && tld_ok
}

/// A fresh password hash that never verifies
pub fn make_unusable_password() -> String {
    format!("{}{}", UNUSABLE_PASSWORD_PREFIX, Uuid::new_v4().simple())
}

pub fn has_usable_password(password_hash: &str) -> bool {
    !password_hash.is_empty() && !password_hash.starts_with(UNUSABLE_PASSWORD_PREFIX)
}

/// Create a new user
pub async fn create_user<'e, E>(executor: E, new_user: NewUser) -> Result<User, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();
    let facebook = new_user.facebook.as_ref();

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (
            id, email, password_hash, is_active, first_name, last_name,
            facebook_id, facebook_access_token, facebook_token_expires_at,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(new_user.is_active)
    .bind(facebook.and_then(|link| link.first_name.clone()))
    .bind(facebook.and_then(|link| link.last_name.clone()))
    .bind(facebook.map(|link| link.facebook_id.clone()))
    .bind(facebook.map(|link| link.access_token.clone()))
    .bind(facebook.and_then(|link| link.token_expires_at))
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(user)
}

/// Get user by email
pub async fn get_user_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(executor)
        .await
}

/// Get user by ID
pub async fn get_user_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Get user by linked Facebook account
pub async fn get_user_by_facebook_id<'e, E>(
    executor: E,
    facebook_id: &str,
) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE facebook_id = ?")
        .bind(facebook_id)
        .fetch_optional(executor)
        .await
}

/// Replace the user's password hash
pub async fn set_password_hash<'e, E>(
    executor: E,
    user_id: Uuid,
    password_hash: &str,
) -> Result<User, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET password_hash = ?, updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(password_hash)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(executor)
    .await
}

/// Mark the user active
pub async fn activate_user<'e, E>(executor: E, user_id: Uuid) -> Result<User, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET is_active = 1, updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(executor)
    .await
}

/// Delete a user; its confirmations go with it
pub async fn delete_user<'e, E>(executor: E, user_id: Uuid) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Store Facebook account data on an existing user and activate it
///
/// Names already set on the user are kept; Facebook only fills blanks.
pub async fn link_facebook_account<'e, E>(
    executor: E,
    user_id: Uuid,
    link: &FacebookLink,
) -> Result<User, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET facebook_id = ?,
            facebook_access_token = ?,
            facebook_token_expires_at = ?,
            first_name = COALESCE(first_name, ?),
            last_name = COALESCE(last_name, ?),
            is_active = 1,
            updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&link.facebook_id)
    .bind(&link.access_token)
    .bind(link.token_expires_at)
    .bind(&link.first_name)
    .bind(&link.last_name)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(executor)
    .await
}

/// Find the user for a Facebook profile or create one
///
/// Matches on the Facebook id first, then on the email address. Returns the
/// user and whether it was created.
///
/// An inactive account matched by email never proved it owns the address,
/// so its password is made unusable and its pending confirmation links are
/// consumed before Facebook activates it.
pub async fn get_or_create_facebook_user(
    pool: &SqlitePool,
    email: &str,
    link: &FacebookLink,
) -> Result<(User, bool), sqlx::Error> {
    let email = normalize_email(email);
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    let existing = match get_user_by_facebook_id(&mut *tx, &link.facebook_id).await? {
        Some(user) => Some(user),
        None => get_user_by_email(&mut *tx, &email).await?,
    };

    let result = match existing {
        Some(user) => {
            if !user.is_active {
                tracing::info!("Discarding unconfirmed password of user {}", user.id);
                set_password_hash(&mut *tx, user.id, &make_unusable_password()).await?;
                consume_pending_confirmations(&mut *tx, user.id).await?;
            }
            tracing::info!("Linking Facebook account to existing user {}", user.id);
            (link_facebook_account(&mut *tx, user.id, link).await?, false)
        }
        None => {
            let new_user = NewUser {
                email,
                password_hash: make_unusable_password(),
                is_active: true,
                facebook: Some(link.clone()),
            };
            let user = create_user(&mut *tx, new_user).await?;
            tracing::info!("Created user {} from Facebook account", user.id);
            (user, true)
        }
    };

    tx.commit().await?;
    Ok(result)
}

/// Verify credentials the way a login form does
///
/// Returns `None` for unknown emails, inactive users, unusable passwords and
/// wrong passwords alike.
pub async fn authenticate(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<Option<User>, sqlx::Error> {
    let Some(user) = get_user_by_email(pool, &normalize_email(email)).await? else {
        return Ok(None);
    };

    if !user.is_active || !user.has_usable_password() {
        return Ok(None);
    }

    let valid = bcrypt::verify(password, &user.password_hash).unwrap_or_else(|e| {
        tracing::warn!("Stored password hash for user {} is unreadable: {:?}", user.id, e);
        false
    });

    Ok(valid.then_some(user))
}
