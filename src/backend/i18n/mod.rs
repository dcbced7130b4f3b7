//! Localized Messages
//!
//! Every user-facing string (validation messages, page text, mail text) goes
//! through [`Locale::tr`]. English and French are bundled; the request locale
//! is negotiated from `Accept-Language` by the [`RequestLocale`] extractor and
//! falls back to the configured `LANGUAGE_CODE`.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::request::Parts;

use crate::shared::Settings;

/// Supported locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Fr,
}

/// Catalogue entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<'a> {
    FieldRequired,
    InvalidEmail,
    EmailTaken,
    InvalidLink,
    EmailExpired,
    InvalidCredentials,
    PasswordTooShort { min_length: usize },
    PasswordTooCommon,
    PasswordEntirelyNumeric,
    PasswordTooSimilar { attribute: UserAttribute },
    InvalidSignedRequest,
    FacebookLoginFailed,
    FacebookEmailRequired,
    FacebookLoginButton,
    WelcomeTitle,
    WelcomeBody { email: &'a str },
    ErrorTitle,
    ConfirmationSubject { site_name: &'a str },
    ConfirmationBody { site_name: &'a str, link: &'a str },
}

/// User fields a password is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAttribute {
    Email,
}

impl Locale {
    /// Parse a language tag such as `fr`, `fr-CA` or `en_US`
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Self::En),
            "fr" => Some(Self::Fr),
            _ => None,
        }
    }

    /// Pick the best supported locale from an `Accept-Language` value
    pub fn negotiate(header: &str) -> Option<Self> {
        let mut candidates: Vec<(f32, Self)> = header
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.split(';');
                let locale = Self::from_tag(parts.next()?)?;
                let quality = parts
                    .find_map(|param| param.trim().strip_prefix("q="))
                    .map(|q| q.trim().parse::<f32>().unwrap_or(0.0))
                    .unwrap_or(1.0);
                (quality > 0.0).then_some((quality, locale))
            })
            .collect();
        // Stable sort keeps header order between equal weights.
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        candidates.first().map(|(_, locale)| *locale)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }

    /// Translate a catalogue entry
    pub fn tr(self, message: Message<'_>) -> String {
        match self {
            Self::En => english(message),
            Self::Fr => french(message),
        }
    }
}

fn english(message: Message<'_>) -> String {
    match message {
        Message::FieldRequired => "This field is required.".to_string(),
        Message::InvalidEmail => "Enter a valid email address.".to_string(),
        Message::EmailTaken => "A user with that email address already exists.".to_string(),
        Message::InvalidLink => "Invalid link".to_string(),
        Message::EmailExpired => "Email expired, please register again".to_string(),
        Message::InvalidCredentials => "Invalid email or password".to_string(),
        Message::PasswordTooShort { min_length } => format!(
            "This password is too short. It must contain at least {min_length} {}.",
            if min_length == 1 { "character" } else { "characters" }
        ),
        Message::PasswordTooCommon => "This password is too common.".to_string(),
        Message::PasswordEntirelyNumeric => "This password is entirely numeric.".to_string(),
        Message::PasswordTooSimilar { attribute } => match attribute {
            UserAttribute::Email => "The password is too similar to the email address.".to_string(),
        },
        Message::InvalidSignedRequest => "Invalid signed request".to_string(),
        Message::FacebookLoginFailed => "Facebook login failed".to_string(),
        Message::FacebookEmailRequired => {
            "Your Facebook account must share an email address".to_string()
        }
        Message::FacebookLoginButton => "Log in with Facebook".to_string(),
        Message::WelcomeTitle => "Welcome".to_string(),
        Message::WelcomeBody { email } => {
            format!("Your email address {email} is confirmed. You can now log in.")
        }
        Message::ErrorTitle => "Error".to_string(),
        Message::ConfirmationSubject { site_name } => {
            format!("Confirm your email address on {site_name}")
        }
        Message::ConfirmationBody { site_name, link } => format!(
            "Welcome to {site_name}!\n\n\
             Please confirm your email address by following this link:\n\n\
             {link}\n\n\
             If you did not sign up, you can ignore this message.\n"
        ),
    }
}

fn french(message: Message<'_>) -> String {
    match message {
        Message::FieldRequired => "Ce champ est obligatoire.".to_string(),
        Message::InvalidEmail => "Saisissez une adresse e-mail valide.".to_string(),
        Message::EmailTaken => "Un utilisateur avec cette adresse e-mail existe déjà.".to_string(),
        Message::InvalidLink => "Lien invalide".to_string(),
        Message::EmailExpired => "Le lien a expiré, veuillez vous réinscrire".to_string(),
        Message::InvalidCredentials => "Adresse e-mail ou mot de passe invalide".to_string(),
        Message::PasswordTooShort { min_length } => format!(
            "Ce mot de passe est trop court. Il doit contenir au minimum {min_length} {}.",
            if min_length == 1 { "caractère" } else { "caractères" }
        ),
        Message::PasswordTooCommon => "Ce mot de passe est trop courant.".to_string(),
        Message::PasswordEntirelyNumeric => {
            "Ce mot de passe est entièrement numérique.".to_string()
        }
        Message::PasswordTooSimilar { attribute } => match attribute {
            UserAttribute::Email => {
                "Le mot de passe est trop semblable au champ « adresse e-mail ».".to_string()
            }
        },
        Message::InvalidSignedRequest => "Requête signée invalide".to_string(),
        Message::FacebookLoginFailed => "La connexion avec Facebook a échoué".to_string(),
        Message::FacebookEmailRequired => {
            "Votre compte Facebook doit partager une adresse e-mail".to_string()
        }
        Message::FacebookLoginButton => "Se connecter avec Facebook".to_string(),
        Message::WelcomeTitle => "Bienvenue".to_string(),
        Message::WelcomeBody { email } => format!(
            "Votre adresse e-mail {email} est confirmée. Vous pouvez maintenant vous connecter."
        ),
        Message::ErrorTitle => "Erreur".to_string(),
        Message::ConfirmationSubject { site_name } => {
            format!("Confirmez votre adresse e-mail sur {site_name}")
        }
        Message::ConfirmationBody { site_name, link } => format!(
            "Bienvenue sur {site_name} !\n\n\
             Veuillez confirmer votre adresse e-mail en suivant ce lien :\n\n\
             {link}\n\n\
             Si vous ne vous êtes pas inscrit, vous pouvez ignorer ce message.\n"
        ),
    }
}

/// Locale negotiated for the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLocale(pub Locale);

impl<S> FromRequestParts<S> for RequestLocale
where
    S: Send + Sync,
    Arc<Settings>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let settings = Arc::<Settings>::from_ref(state);
        let fallback = Locale::from_tag(&settings.language_code).unwrap_or_default();
        let locale = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(Locale::negotiate)
            .unwrap_or(fallback);
        Ok(Self(locale))
    }
}
