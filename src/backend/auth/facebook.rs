/**
 * Facebook Login
 *
 * The browser SDK hands the client a signed request, which the client posts
 * to `/api/auth/facebook`. The backend verifies it with the app secret, then
 * talks to the Graph API to load the profile and swap the short-lived user
 * token for an extended one.
 *
 * # Signed Request Format
 *
 * `base64url(signature).base64url(payload)` where `signature` is
 * HMAC-SHA256 of the encoded payload keyed with the app secret, and the
 * payload is a JSON object carrying `algorithm`, `user_id`, and either an
 * `oauth_token` or a `code`.
 */

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::backend::auth::users::FacebookLink;
use crate::shared::config::FacebookSettings;

const SIGNED_REQUEST_ALGORITHM: &str = "HMAC-SHA256";
const PROFILE_FIELDS: &str = "email,first_name,last_name,third_party_id";

/// Upper bound on a whole Graph API call
pub const GRAPH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Facebook login errors
#[derive(Debug, Error)]
pub enum FacebookError {
    #[error("invalid signed request: {0}")]
    InvalidSignedRequest(String),
    #[error("Graph API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Graph API error: {message}")]
    Graph { message: String },
    #[error("unexpected Graph API response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Facebook profile has no email address")]
    MissingEmail,
}

/// Verified signed request payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRequest {
    pub algorithm: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub issued_at: Option<i64>,
    #[serde(default)]
    pub oauth_token: Option<String>,
    #[serde(default)]
    pub expires: Option<i64>,
    #[serde(default)]
    pub code: Option<String>,
}

impl SignedRequest {
    /// Verify and decode a signed request
    pub fn parse(raw: &str, app_secret: &str) -> Result<Self, FacebookError> {
        let raw = raw.trim();
        let (signature_b64, payload_b64) = raw
            .split_once('.')
            .ok_or_else(|| invalid("expected signature.payload"))?;

        let signature = b64url_decode(signature_b64)?;
        let mut mac = Hmac::<Sha256>::new_from_slice(app_secret.as_bytes())
            .map_err(|e| invalid(format!("unusable app secret: {e}")))?;
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| invalid("signature mismatch"))?;

        let payload = b64url_decode(payload_b64)?;
        let request: SignedRequest = serde_json::from_slice(&payload)
            .map_err(|e| invalid(format!("payload is not valid JSON: {e}")))?;

        if !request.algorithm.eq_ignore_ascii_case(SIGNED_REQUEST_ALGORITHM) {
            return Err(invalid(format!("unsupported algorithm {}", request.algorithm)));
        }

        Ok(request)
    }

    /// Encode and sign a payload the way the Facebook SDK does
    pub fn generate<T: Serialize>(payload: &T, app_secret: &str) -> Result<String, FacebookError> {
        let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload)?);
        let mut mac = Hmac::<Sha256>::new_from_slice(app_secret.as_bytes())
            .map_err(|e| invalid(format!("unusable app secret: {e}")))?;
        mac.update(payload_b64.as_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{signature_b64}.{payload_b64}"))
    }
}

fn invalid(reason: impl Into<String>) -> FacebookError {
    FacebookError::InvalidSignedRequest(reason.into())
}

/// Facebook pads some segments even though they are URL-safe encoded
fn b64url_decode(segment: &str) -> Result<Vec<u8>, FacebookError> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('=').as_bytes())
        .map_err(|e| invalid(format!("invalid base64url: {e}")))
}

/// Profile fields read from `/me`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FacebookProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub third_party_id: Option<String>,
}

/// User access token with its expiry, when known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl AccessTokenResponse {
    /// An `expires_in` too large to represent counts as no expiry
    fn into_token(self, now: DateTime<Utc>) -> AccessToken {
        let expires_at = self
            .expires_in
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime));
        AccessToken {
            token: self.access_token,
            expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    message: String,
}

/// Result of a successful Facebook login
#[derive(Debug, Clone)]
pub struct FacebookLogin {
    pub email: String,
    pub link: FacebookLink,
}

/// HTTP client for Graph API calls, giving up after `timeout`
pub fn graph_http_client(timeout: std::time::Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

/// Graph API client
#[derive(Debug, Clone)]
pub struct FacebookClient {
    http: Client,
    graph_url: String,
    app_id: String,
    app_secret: String,
}

impl FacebookClient {
    pub fn new(http: Client, graph_url: &str, app: FacebookSettings) -> Self {
        Self {
            http,
            graph_url: graph_url.trim_end_matches('/').to_string(),
            app_id: app.app_id,
            app_secret: app.app_secret,
        }
    }

    pub fn parse_signed_request(&self, raw: &str) -> Result<SignedRequest, FacebookError> {
        SignedRequest::parse(raw, &self.app_secret)
    }

    /// Run the whole login exchange for a verified signed request
    pub async fn login(&self, request: &SignedRequest) -> Result<FacebookLogin, FacebookError> {
        let user_token = match (&request.oauth_token, &request.code) {
            (Some(token), _) => token.clone(),
            (None, Some(code)) => self.exchange_code(code).await?.token,
            (None, None) => return Err(invalid("neither oauth_token nor code present")),
        };

        let profile = self.profile(&user_token).await?;
        let email = profile
            .email
            .clone()
            .filter(|email| !email.trim().is_empty())
            .ok_or(FacebookError::MissingEmail)?;
        let extended = self.extended_access_token(&user_token).await?;

        tracing::debug!(
            "Facebook login for profile {} (third party id {:?})",
            profile.id,
            profile.third_party_id
        );

        Ok(FacebookLogin {
            email,
            link: FacebookLink {
                facebook_id: profile.id,
                first_name: profile.first_name,
                last_name: profile.last_name,
                access_token: extended.token,
                token_expires_at: extended.expires_at,
            },
        })
    }

    /// Trade an authorization code for a user access token
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, FacebookError> {
        let response: AccessTokenResponse = self
            .get_json(
                "oauth/access_token",
                &[
                    ("client_id", self.app_id.as_str()),
                    ("client_secret", self.app_secret.as_str()),
                    ("redirect_uri", ""),
                    ("code", code),
                ],
            )
            .await?;
        Ok(response.into_token(Utc::now()))
    }

    pub async fn profile(&self, access_token: &str) -> Result<FacebookProfile, FacebookError> {
        self.get_json(
            "me",
            &[("fields", PROFILE_FIELDS), ("access_token", access_token)],
        )
        .await
    }

    /// Swap a short-lived user token for a long-lived one
    pub async fn extended_access_token(&self, access_token: &str) -> Result<AccessToken, FacebookError> {
        let response: AccessTokenResponse = self
            .get_json(
                "oauth/access_token",
                &[
                    ("grant_type", "fb_exchange_token"),
                    ("client_id", self.app_id.as_str()),
                    ("client_secret", self.app_secret.as_str()),
                    ("fb_exchange_token", access_token),
                ],
            )
            .await?;
        Ok(response.into_token(Utc::now()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FacebookError> {
        let url = format!("{}/{}", self.graph_url, path);
        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if let Ok(graph_error) = serde_json::from_slice::<GraphErrorBody>(&body) {
            return Err(FacebookError::Graph {
                message: graph_error.error.message,
            });
        }
        if !status.is_success() {
            return Err(FacebookError::Graph {
                message: format!("{} returned {}", path, status),
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}
