/**
 * Authentication Handler Types
 *
 * Request and response bodies for the JSON authentication endpoints.
 * Request fields are optional so that a missing field is reported as
 * "This field is required." instead of a body rejection.
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::auth::users::User;

/// Sign up request
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: Option<String>,
    /// Plain password, hashed before storage
    #[serde(default)]
    pub password: Option<String>,
}

/// Email confirmation request
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct ConfirmEmailRequest {
    #[serde(default)]
    pub email: Option<String>,
    /// Token from the confirmation link
    #[serde(default)]
    pub token: Option<String>,
}

/// Login request
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Facebook login request
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct FacebookLoginRequest {
    /// Signed request from the Facebook JS SDK
    #[serde(default)]
    pub signed_request: Option<String>,
}

/// Created account, returned by signup
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignupResponse {
    pub id: Uuid,
    pub email: String,
    /// Always `false` until the email is confirmed
    pub is_active: bool,
}

impl From<&User> for SignupResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_active: user.is_active,
        }
    }
}

/// Auth response
///
/// Returned by login, email confirmation and Facebook login.
#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    /// Session JWT
    pub token: String,
    pub user: UserResponse,
}

/// User response (without sensitive data)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_active: user.is_active,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}
