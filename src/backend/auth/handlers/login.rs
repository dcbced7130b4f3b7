/**
 * Login Handler
 *
 * This module implements the user authentication handler for POST /api/auth/login.
 *
 * # Authentication Process
 *
 * 1. Validate the email and password fields
 * 2. Look up the user by email and require an active account
 * 3. Verify the password using bcrypt
 * 4. Return a session token and the user
 *
 * # Security
 *
 * Unknown emails, inactive accounts and wrong passwords all produce the same
 * `{"errors": ["Invalid email or password"]}` body.
 */

use axum::{extract::State, response::Json};

use crate::backend::auth::handlers::fields;
use crate::backend::auth::handlers::types::{AuthResponse, LoginRequest, UserResponse};
use crate::backend::auth::users::authenticate;
use crate::backend::error::ApiError;
use crate::backend::i18n::{Message, RequestLocale};
use crate::backend::server::state::AppState;
use crate::shared::ValidationErrors;

/// Login handler
pub async fn login(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mut errors = ValidationErrors::new();
    let email = fields::email(&mut errors, locale, "email", request.email.as_deref());
    let password = fields::required(&mut errors, locale, "password", request.password.as_deref());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(errors.into());
    };
    tracing::info!("Login request for: {}", email);

    let user = authenticate(&state.db_pool, &email, password)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Invalid credentials for: {}", email);
            ValidationErrors::non_field(locale.tr(Message::InvalidCredentials))
        })?;

    let token = state.sessions.issue(&user)?;
    tracing::info!("User logged in successfully: {} ({})", user.id, user.email);

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(&user),
    }))
}
