/**
 * Signup Handler
 *
 * This module implements the user registration handler for POST /api/auth/signup.
 *
 * # Registration Process
 *
 * 1. Validate the email and password fields
 * 2. Check that the email is free (or may be registered again)
 * 3. Run the password policy against the unsaved user
 * 4. Hash the password, then create the inactive user and its confirmation
 *    in one `BEGIN IMMEDIATE` transaction
 * 5. Mail the confirmation link
 * 6. Return the new account
 *
 * The transaction commits before the mail goes out, so a slow SMTP relay
 * never holds the database write lock. When sending fails, the rows created
 * in step 4 are removed again and the request answers 502.
 */

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{Duration, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::backend::auth::confirmations::{
    can_register_again, create_confirmation, delete_confirmation, list_confirmations,
};
use crate::backend::auth::handlers::fields;
use crate::backend::auth::handlers::types::{SignupRequest, SignupResponse};
use crate::backend::auth::password_validation::UserAttributes;
use crate::backend::auth::users::{
    create_user, delete_user, get_user_by_email, set_password_hash, NewUser, User,
};
use crate::backend::error::ApiError;
use crate::backend::i18n::{Message, RequestLocale};
use crate::backend::mail::confirmation_mail;
use crate::backend::server::state::AppState;
use crate::shared::ValidationErrors;

/// Account already stored under the requested email
enum ExistingAccount {
    Free,
    /// Inactive account whose links all lapsed unused
    Lapsed(User),
    Taken,
}

/// What step 4 changed, so it can be reverted
enum Registration {
    Created,
    Reused { previous_hash: String },
}

/// Sign up handler
///
/// # Errors
///
/// * `400 Bad Request` - field map with every failing check
/// * `502 Bad Gateway` - the confirmation mail could not be sent
/// * `500 Internal Server Error` - database or hashing failure
///
/// # Example Request
///
/// ```http
/// POST /api/auth/signup HTTP/1.1
/// Content-Type: application/json
///
/// {"email": "user@example.com", "password": "tangerine-otter-42"}
/// ```
///
/// # Example Response
///
/// ```json
/// {"id": "123e4567-e89b-12d3-a456-426614174000", "email": "user@example.com", "is_active": false}
/// ```
pub async fn signup(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let mut errors = ValidationErrors::new();
    let email = fields::email(&mut errors, locale, "email", request.email.as_deref());
    let password = fields::required(&mut errors, locale, "password", request.password.as_deref());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(errors.into());
    };
    tracing::info!("Signup request for email: {}", email);

    let email_taken = || ApiError::from(ValidationErrors::field("email", locale.tr(Message::EmailTaken)));
    let settings = &state.settings;
    let lifetime = settings.email_confirmation_lifetime;

    // Uniqueness is reported before the password policy runs
    let taken = {
        let mut conn = state.db_pool.acquire().await?;
        matches!(existing_account(&mut conn, &email, lifetime).await?, ExistingAccount::Taken)
    };
    if taken {
        tracing::warn!("Email already exists: {}", email);
        return Err(email_taken());
    }

    let attributes = UserAttributes { email: &email };
    if let Err(messages) = state.password_policy.validate(password, &attributes, locale) {
        tracing::warn!("Signup for {} rejected by password policy", email);
        errors.extend_field("password", messages);
        return Err(errors.into());
    }

    let password_hash = bcrypt::hash(password, settings.bcrypt_cost)?;

    let mut tx = state.db_pool.begin_with("BEGIN IMMEDIATE").await?;

    let (user, registration) = match existing_account(&mut tx, &email, lifetime).await? {
        ExistingAccount::Taken => {
            tracing::warn!("Email registered concurrently: {}", email);
            return Err(email_taken());
        }
        ExistingAccount::Lapsed(user) => {
            tracing::info!("Registering lapsed account {} again", user.id);
            let previous_hash = user.password_hash;
            let user = set_password_hash(&mut *tx, user.id, &password_hash).await?;
            (user, Registration::Reused { previous_hash })
        }
        ExistingAccount::Free => {
            match create_user(&mut *tx, NewUser::inactive(&email, password_hash)).await {
                Ok(user) => (user, Registration::Created),
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    tracing::warn!("Email registered concurrently: {}", email);
                    return Err(email_taken());
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    let confirmation = create_confirmation(&mut *tx, user.id).await?;
    tx.commit().await?;

    let mail = confirmation_mail(
        settings,
        locale,
        &user.email,
        &confirmation.external_id.to_string(),
    );
    if let Err(e) = state.mailer.send(mail).await {
        if let Err(undo_error) =
            undo_signup(&state.db_pool, user.id, confirmation.id, registration).await
        {
            tracing::error!("Failed to undo signup of user {}: {:?}", user.id, undo_error);
        }
        return Err(e.into());
    }

    tracing::info!("User created successfully: {} ({})", user.id, user.email);

    Ok((StatusCode::CREATED, Json(SignupResponse::from(&user))))
}

async fn existing_account(
    conn: &mut SqliteConnection,
    email: &str,
    lifetime: Duration,
) -> Result<ExistingAccount, sqlx::Error> {
    let Some(user) = get_user_by_email(&mut *conn, email).await? else {
        return Ok(ExistingAccount::Free);
    };

    let confirmations = list_confirmations(&mut *conn, user.id).await?;
    if can_register_again(&user, &confirmations, lifetime, Utc::now()) {
        Ok(ExistingAccount::Lapsed(user))
    } else {
        Ok(ExistingAccount::Taken)
    }
}

/// Revert a committed signup whose confirmation mail was not sent
async fn undo_signup(
    pool: &SqlitePool,
    user_id: Uuid,
    confirmation_id: i64,
    registration: Registration,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    match registration {
        Registration::Created => delete_user(&mut *tx, user_id).await?,
        Registration::Reused { previous_hash } => {
            delete_confirmation(&mut *tx, confirmation_id).await?;
            set_password_hash(&mut *tx, user_id, &previous_hash).await?;
        }
    }

    tx.commit().await?;
    tracing::info!("Signup of user {} undone after mail failure", user_id);
    Ok(())
}
