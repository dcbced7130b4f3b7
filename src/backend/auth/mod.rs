//! Authentication Module
//!
//! This module handles user registration, email confirmation, login and
//! Facebook login, plus the data and token management behind them.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs                 - Module exports and documentation
//! ├── users.rs               - User model and database operations
//! ├── confirmations.rs       - Email confirmation tokens
//! ├── sessions.rs            - JWT session tokens
//! ├── password_validation.rs - Password policy
//! ├── facebook.rs            - Signed requests and Graph API client
//! └── handlers/              - HTTP handlers
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Signup**: email and password validated, inactive user created, confirmation link mailed
//! 2. **Confirm**: link followed (page) or posted with the email (API), user activated
//! 3. **Login**: active user's password verified, session token returned
//! 4. **Facebook**: signed request verified, profile loaded, user matched or created
//! 5. **Get Me**: session token verified, user returned
//!
//! # Security
//!
//! - Passwords are hashed with bcrypt; Facebook-only users get an unusable hash
//! - Confirmation tokens are random UUIDs, single use, and expire
//! - Session tokens are HS256 JWTs signed with `JWT_SECRET`
//! - Failed logins never reveal whether the email exists

/// User data model and database operations
pub mod users;

/// Email confirmation tokens
pub mod confirmations;

/// JWT token generation and validation
pub mod sessions;

/// Password policy run on signup
pub mod password_validation;

/// Facebook signed requests and Graph API client
pub mod facebook;

/// HTTP handlers for authentication endpoints
pub mod handlers;

pub use handlers::types::{AuthResponse, SignupResponse, UserResponse};
pub use handlers::{confirm_email, facebook_login, get_me, login, signup};
