//! Application configuration module
//!
//! Settings are read from environment variables (see [`Settings::from_env`])
//! or assembled with [`SettingsBuilder`]. Every value has a development
//! default except the JWT secret, which release builds must set.

use chrono::{Duration, Utc};
use thiserror::Error;

const DEV_JWT_SECRET: &str = "insecure-development-secret";
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;
/// Lifetimes above a century are rejected
const MAX_LIFETIME_DAYS: i64 = 36_500;

/// Facebook application credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacebookSettings {
    pub app_id: String,
    pub app_secret: String,
}

/// SMTP relay used to deliver confirmation mails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// sqlx connection string (`sqlite://...`)
    pub database_url: String,
    pub server_port: u16,
    /// Name shown on rendered pages and in mails
    pub site_name: String,
    /// Public base URL used to build confirmation links
    pub site_url: String,
    pub jwt_secret: String,
    pub session_lifetime: Duration,
    /// Time after which an unused confirmation token expires
    pub email_confirmation_lifetime: Duration,
    pub password_min_length: usize,
    pub bcrypt_cost: u32,
    /// Locale used when the request does not ask for a supported one
    pub language_code: String,
    pub facebook_app_id: Option<String>,
    pub facebook_app_secret: Option<String>,
    pub facebook_graph_url: String,
    pub smtp: Option<SmtpSettings>,
    pub default_from_email: String,
}

impl Settings {
    /// Create a new SettingsBuilder
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut builder = Settings::builder();

        if let Some(url) = get("DATABASE_URL") {
            builder = builder.database_url(url);
        }
        if let Some(port) = get("SERVER_PORT") {
            builder = builder.server_port(parse_number("SERVER_PORT", &port)?);
        }
        if let Some(name) = get("SITE_NAME") {
            builder = builder.site_name(name);
        }
        if let Some(url) = get("SITE_URL") {
            builder = builder.site_url(url);
        }
        match get("JWT_SECRET") {
            Some(secret) => builder = builder.jwt_secret(secret),
            None if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
            }
            None => return Err(ConfigError::MissingValue("JWT_SECRET")),
        }
        if let Some(days) = get("SESSION_LIFETIME_DAYS") {
            let days: i64 = parse_number("SESSION_LIFETIME_DAYS", &days)?;
            let lifetime =
                Duration::try_days(days).ok_or_else(|| out_of_range("SESSION_LIFETIME_DAYS"))?;
            builder = builder.session_lifetime(lifetime);
        }
        if let Some(hours) = get("EMAIL_CONFIRMATION_LIFETIME_HOURS") {
            let hours: i64 = parse_number("EMAIL_CONFIRMATION_LIFETIME_HOURS", &hours)?;
            let lifetime = Duration::try_hours(hours)
                .ok_or_else(|| out_of_range("EMAIL_CONFIRMATION_LIFETIME_HOURS"))?;
            builder = builder.email_confirmation_lifetime(lifetime);
        }
        if let Some(length) = get("PASSWORD_MIN_LENGTH") {
            builder = builder.password_min_length(parse_number("PASSWORD_MIN_LENGTH", &length)?);
        }
        if let Some(cost) = get("BCRYPT_COST") {
            builder = builder.bcrypt_cost(parse_number("BCRYPT_COST", &cost)?);
        }
        if let Some(code) = get("LANGUAGE_CODE") {
            builder = builder.language_code(code);
        }
        if let Some(app_id) = get("FACEBOOK_APP_ID") {
            builder = builder.facebook_app_id(app_id);
        }
        if let Some(secret) = get("FACEBOOK_APP_SECRET_KEY") {
            builder = builder.facebook_app_secret(secret);
        }
        if let Some(url) = get("FACEBOOK_GRAPH_URL") {
            builder = builder.facebook_graph_url(url);
        }
        if let Some(host) = get("SMTP_HOST") {
            let port = get("SMTP_PORT")
                .map(|port| parse_number("SMTP_PORT", &port))
                .transpose()?;
            builder = builder.smtp(SmtpSettings {
                host,
                port,
                username: get("SMTP_USERNAME"),
                password: get("SMTP_PASSWORD"),
            });
        }
        if let Some(from) = get("DEFAULT_FROM_EMAIL") {
            builder = builder.default_from_email(from);
        }

        builder.build()
    }

    /// App id and secret, when both are configured
    pub fn facebook(&self) -> Option<FacebookSettings> {
        match (&self.facebook_app_id, &self.facebook_app_secret) {
            (Some(app_id), Some(app_secret)) => Some(FacebookSettings {
                app_id: app_id.clone(),
                app_secret: app_secret.clone(),
            }),
            _ => None,
        }
    }

    /// Absolute link to the confirmation landing page for `token`
    pub fn confirmation_url(&self, token: &str) -> String {
        format!("{}/confirm-email/{}", self.site_url.trim_end_matches('/'), token)
    }
}

/// Builder for Settings
#[derive(Debug)]
pub struct SettingsBuilder {
    database_url: String,
    server_port: u16,
    site_name: String,
    site_url: String,
    jwt_secret: String,
    session_lifetime: Duration,
    email_confirmation_lifetime: Duration,
    password_min_length: usize,
    bcrypt_cost: u32,
    language_code: String,
    facebook_app_id: Option<String>,
    facebook_app_secret: Option<String>,
    facebook_graph_url: String,
    smtp: Option<SmtpSettings>,
    default_from_email: String,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self {
            database_url: "sqlite://rest_auth.db".to_string(),
            server_port: 3000,
            site_name: "Demo".to_string(),
            site_url: "http://localhost:3000".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_lifetime: Duration::days(30),
            email_confirmation_lifetime: Duration::days(7),
            password_min_length: 8,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            language_code: "en".to_string(),
            facebook_app_id: None,
            facebook_app_secret: None,
            facebook_graph_url: "https://graph.facebook.com".to_string(),
            smtp: None,
            default_from_email: "webmaster@localhost".to_string(),
        }
    }
}

impl SettingsBuilder {
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn server_port(mut self, port: u16) -> Self {
        self.server_port = port;
        self
    }

    pub fn site_name(mut self, name: impl Into<String>) -> Self {
        self.site_name = name.into();
        self
    }

    pub fn site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = url.into();
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = secret.into();
        self
    }

    pub fn session_lifetime(mut self, lifetime: Duration) -> Self {
        self.session_lifetime = lifetime;
        self
    }

    pub fn email_confirmation_lifetime(mut self, lifetime: Duration) -> Self {
        self.email_confirmation_lifetime = lifetime;
        self
    }

    pub fn password_min_length(mut self, length: usize) -> Self {
        self.password_min_length = length;
        self
    }

    pub fn bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn language_code(mut self, code: impl Into<String>) -> Self {
        self.language_code = code.into();
        self
    }

    pub fn facebook_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.facebook_app_id = Some(app_id.into());
        self
    }

    pub fn facebook_app_secret(mut self, secret: impl Into<String>) -> Self {
        self.facebook_app_secret = Some(secret.into());
        self
    }

    pub fn facebook_graph_url(mut self, url: impl Into<String>) -> Self {
        self.facebook_graph_url = url.into();
        self
    }

    pub fn smtp(mut self, smtp: SmtpSettings) -> Self {
        self.smtp = Some(smtp);
        self
    }

    pub fn default_from_email(mut self, from: impl Into<String>) -> Self {
        self.default_from_email = from.into();
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<Settings, ConfigError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                reason: format!("must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}"),
            });
        }
        check_lifetime("SESSION_LIFETIME_DAYS", self.session_lifetime)?;
        check_lifetime("EMAIL_CONFIRMATION_LIFETIME_HOURS", self.email_confirmation_lifetime)?;
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if !self.site_url.starts_with("http://") && !self.site_url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.site_url));
        }

        Ok(Settings {
            database_url: self.database_url,
            server_port: self.server_port,
            site_name: self.site_name,
            site_url: self.site_url,
            jwt_secret: self.jwt_secret,
            session_lifetime: self.session_lifetime,
            email_confirmation_lifetime: self.email_confirmation_lifetime,
            password_min_length: self.password_min_length,
            bcrypt_cost: self.bcrypt_cost,
            language_code: self.language_code,
            facebook_app_id: self.facebook_app_id,
            facebook_app_secret: self.facebook_app_secret,
            facebook_graph_url: self.facebook_graph_url,
            smtp: self.smtp,
            default_from_email: self.default_from_email,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        reason: format!("{value:?} is not a valid number"),
    })
}

fn out_of_range(key: &'static str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: format!("must not exceed {MAX_LIFETIME_DAYS} days"),
    }
}

/// Lifetimes must be positive and small enough to add to the current time
fn check_lifetime(key: &'static str, lifetime: Duration) -> Result<(), ConfigError> {
    if lifetime <= Duration::zero() {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be positive".to_string(),
        });
    }
    let within_bound = Duration::try_days(MAX_LIFETIME_DAYS).is_some_and(|max| lifetime <= max);
    if !within_bound || Utc::now().checked_add_signed(lifetime).is_none() {
        return Err(out_of_range(key));
    }
    Ok(())
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
