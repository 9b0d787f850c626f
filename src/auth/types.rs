//! Authentication types
//!
//! Access tokens handed to the transport, and the credential material the
//! token providers load once at startup.

use serde::Deserialize;
use std::path::Path;

use crate::error::AuthError;

/// Environment variable pointing at a credentials JSON file
pub const CREDENTIALS_ENV: &str = "FIRESTORE_CREDENTIALS";

/// OAuth scope required by the Firestore REST API
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Seconds before expiry at which a token is treated as stale
pub const REFRESH_MARGIN_SECS: i64 = 300;

/// Bearer token for outgoing requests
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Token value sent as `Authorization: Bearer {access_token}`
    pub access_token: String,
    /// Expiration timestamp (seconds since epoch); `None` never expires
    pub expires_at: Option<i64>,
}

impl AccessToken {
    /// Token that never expires
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// Token expiring `expires_in` seconds from now
    pub fn expiring_in(access_token: impl Into<String>, expires_in: i64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: Some(chrono::Utc::now().timestamp() + expires_in),
        }
    }

    /// Token expires in less than 5 minutes
    pub fn needs_refresh(&self) -> bool {
        match self.expires_at {
            Some(expiration) => chrono::Utc::now().timestamp() >= expiration - REFRESH_MARGIN_SECS,
            None => false,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token endpoint response (`oauth2.googleapis.com/token`, metadata server)
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    #[serde(default)]
    pub(crate) expires_in: Option<i64>,
}

impl TokenResponse {
    pub(crate) fn into_access_token(self) -> AccessToken {
        // Default: 1 hour expiration
        AccessToken::expiring_in(self.access_token, self.expires_in.unwrap_or(3600))
    }
}

/// User credentials as written by `gcloud auth application-default login`
#[derive(Clone, Deserialize)]
pub struct AuthorizedUserCredentials {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Long-lived refresh token
    pub refresh_token: String,
}

impl std::fmt::Debug for AuthorizedUserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Service account key file as downloaded from the Cloud console
#[derive(Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    /// Account email, used as the assertion issuer
    pub client_email: String,
    /// PEM-encoded RSA private key
    pub private_key: String,
    /// Key id, sent as the JWT `kid` header
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// Token endpoint named by the key file
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Credentials file contents, discriminated by its `type` field
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    /// `"type": "authorized_user"`
    AuthorizedUser(AuthorizedUserCredentials),
    /// `"type": "service_account"`
    ServiceAccount(ServiceAccountCredentials),
}

impl Credentials {
    /// Parse a credentials JSON document
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let credentials: Credentials = serde_json::from_str(json).map_err(|e| {
            AuthError::InvalidCredential(format!("unrecognized credentials file: {}", e))
        })?;

        // Validate required secrets (error case first)
        match &credentials {
            Credentials::AuthorizedUser(user) if user.refresh_token.is_empty() => Err(
                AuthError::InvalidCredential("refresh_token must not be empty".to_string()),
            ),
            Credentials::ServiceAccount(account) if account.client_email.is_empty() => Err(
                AuthError::InvalidCredential("client_email must not be empty".to_string()),
            ),
            Credentials::ServiceAccount(account) if account.private_key.is_empty() => Err(
                AuthError::InvalidCredential("private_key must not be empty".to_string()),
            ),
            _ => Ok(credentials),
        }
    }

    /// Load a credentials file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AuthError::InvalidCredential(format!(
                "unable to read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    /// Load the file named by `FIRESTORE_CREDENTIALS`
    pub fn from_env() -> Result<Self, AuthError> {
        let path = std::env::var(CREDENTIALS_ENV)
            .map_err(|_| AuthError::CredentialsNotConfigured(CREDENTIALS_ENV.to_string()))?;
        Self::from_file(path)
    }

    fn into_authorized_user(self) -> Result<AuthorizedUserCredentials, AuthError> {
        match self {
            Credentials::AuthorizedUser(credentials) => Ok(credentials),
            Credentials::ServiceAccount(_) => Err(AuthError::InvalidCredential(
                "expected an \"authorized_user\" credentials file, got \"service_account\"".to_string(),
            )),
        }
    }
}

impl AuthorizedUserCredentials {
    /// Parse an `authorized_user` credentials JSON document
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        Credentials::from_json(json)?.into_authorized_user()
    }

    /// Load an `authorized_user` credentials file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        Credentials::from_file(path)?.into_authorized_user()
    }

    /// Load the file named by `FIRESTORE_CREDENTIALS`
    pub fn from_env() -> Result<Self, AuthError> {
        let path = std::env::var(CREDENTIALS_ENV)
            .map_err(|_| AuthError::CredentialsNotConfigured(CREDENTIALS_ENV.to_string()))?;
        Self::from_file(path)
    }
}
