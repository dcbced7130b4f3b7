//! Authentication Handlers Module
//!
//! HTTP handlers for the JSON authentication endpoints.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs      - Module exports and documentation
//! ├── types.rs    - Request and response types
//! ├── fields.rs   - Shared field checks
//! ├── signup.rs   - User registration handler
//! ├── confirm.rs  - Email confirmation handler
//! ├── login.rs    - User authentication handler
//! ├── facebook.rs - Facebook login handler
//! └── me.rs       - Get current user handler
//! ```
//!
//! # Handlers
//!
//! - **`signup`** - POST /api/auth/signup
//! - **`confirm_email`** - POST /api/auth/confirm-email
//! - **`login`** - POST /api/auth/login
//! - **`facebook_login`** - POST /api/auth/facebook
//! - **`get_me`** - GET /api/auth/me

/// Request and response types
pub mod types;

/// Shared field checks
pub mod fields;

/// Signup handler
pub mod signup;

/// Email confirmation handler
pub mod confirm;

/// Login handler
pub mod login;

/// Facebook login handler
pub mod facebook;

/// Get current user handler
pub mod me;

pub use types::{AuthResponse, ConfirmEmailRequest, FacebookLoginRequest, LoginRequest, SignupRequest, SignupResponse, UserResponse};

pub use confirm::confirm_email;
pub use facebook::facebook_login;
pub use login::login;
pub use me::get_me;
pub use signup::signup;
