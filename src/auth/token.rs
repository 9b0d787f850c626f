//! Access token providers
//!
//! A [`TokenProvider`] is constructed once by the caller and handed to the
//! transport, which asks it for a token before every request. Providers that
//! talk to a token endpoint cache the token and refresh it when it is within
//! five minutes of expiry.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::auth::types::{
    AccessToken, AuthorizedUserCredentials, Credentials, ServiceAccountCredentials, TokenResponse,
    DATASTORE_SCOPE,
};
use crate::error::AuthError;

/// Default OAuth2 token endpoint
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Default compute metadata token endpoint
pub const METADATA_TOKEN_URI: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// OAuth2 grant type for signed service-account assertions
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for service-account assertions (seconds)
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Source of bearer tokens for outgoing requests
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get a token valid for the next request
    async fn get_token(&self) -> Result<AccessToken, AuthError>;
}

/// Provider returning a fixed token
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    /// Token the local emulator accepts for full access
    pub const EMULATOR_TOKEN: &'static str = "owner";

    /// Provider always returning `access_token`
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(access_token),
        }
    }

    /// Provider for the local emulator
    pub fn emulator() -> Self {
        Self::new(Self::EMULATOR_TOKEN)
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<AccessToken, AuthError> {
        // Error-first: empty token
        if self.token.access_token.is_empty() {
            return Err(AuthError::InvalidCredential("access token is empty".to_string()));
        }
        Ok(self.token.clone())
    }
}

/// Cached token shared across requests
#[derive(Default)]
struct TokenCache {
    current: RwLock<Option<AccessToken>>,
}

impl TokenCache {
    async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<AccessToken, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken, AuthError>>,
    {
        if let Some(token) = self.current.read().await.as_ref() {
            if !token.needs_refresh() {
                return Ok(token.clone());
            }
        }

        let mut current = self.current.write().await;
        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = current.as_ref() {
            if !token.needs_refresh() {
                return Ok(token.clone());
            }
        }

        let token = refresh().await?;
        *current = Some(token.clone());
        Ok(token)
    }
}

fn http_client() -> Result<reqwest::Client, AuthError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| AuthError::TokenUnavailable(format!("Failed to create HTTP client: {}", e)))
}

/// Classify a failure to talk to a token endpoint
fn request_failed(endpoint: &str, err: reqwest::Error) -> AuthError {
    tracing::warn!(%endpoint, error = %err, "token endpoint request failed");
    if err.is_connect() || err.is_timeout() || err.is_request() {
        return AuthError::NetworkRequestFailed(format!(
            "unable to reach token endpoint {}: {}",
            endpoint, err
        ));
    }
    AuthError::TokenUnavailable(format!("token request to {} failed: {}", endpoint, err))
}

/// Read a token endpoint response, mapping rejections to credential errors
async fn read_token_response(endpoint: &str, response: reqwest::Response) -> Result<AccessToken, AuthError> {
    let status = response.status();

    // Handle error responses first
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%endpoint, %status, "token endpoint rejected request");
        if status.is_client_error() {
            return Err(AuthError::InvalidCredential(format!(
                "token endpoint rejected credentials ({}): {}",
                status, body
            )));
        }
        return Err(AuthError::TokenUnavailable(format!(
            "token endpoint returned {}: {}",
            status, body
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| AuthError::TokenUnavailable(format!("Failed to parse token response: {}", e)))?;
    Ok(token.into_access_token())
}

/// Provider exchanging an `authorized_user` refresh token for access tokens
pub struct AuthorizedUserTokenProvider {
    credentials: AuthorizedUserCredentials,
    token_uri: String,
    http_client: reqwest::Client,
    cache: TokenCache,
}

impl AuthorizedUserTokenProvider {
    /// Provider for the given credentials
    pub fn new(credentials: AuthorizedUserCredentials) -> Result<Self, AuthError> {
        Ok(Self {
            credentials,
            token_uri: GOOGLE_TOKEN_URI.to_string(),
            http_client: http_client()?,
            cache: TokenCache::default(),
        })
    }

    /// Load credentials from `FIRESTORE_CREDENTIALS`, failing fast when unset
    pub fn from_env() -> Result<Self, AuthError> {
        Self::new(AuthorizedUserCredentials::from_env()?)
    }

    /// Use a different token endpoint
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    async fn refresh(&self) -> Result<AccessToken, AuthError> {
        tracing::debug!(endpoint = %self.token_uri, "refreshing access token");
        let response = self
            .http_client
            .post(&self.token_uri)
            .json(&serde_json::json!({
                "grant_type": "refresh_token",
                "client_id": self.credentials.client_id,
                "client_secret": self.credentials.client_secret,
                "refresh_token": self.credentials.refresh_token,
                "scope": DATASTORE_SCOPE,
            }))
            .send()
            .await
            .map_err(|e| request_failed(&self.token_uri, e))?;

        read_token_response(&self.token_uri, response).await
    }
}

#[async_trait]
impl TokenProvider for AuthorizedUserTokenProvider {
    async fn get_token(&self) -> Result<AccessToken, AuthError> {
        self.cache.get_or_refresh(|| self.refresh()).await
    }
}

/// Claims of a service-account token request
#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Provider exchanging RS256-signed service-account assertions for access tokens
pub struct ServiceAccountTokenProvider {
    client_email: String,
    key_id: Option<String>,
    signing_key: EncodingKey,
    token_uri: String,
    http_client: reqwest::Client,
    cache: TokenCache,
}

impl ServiceAccountTokenProvider {
    /// Provider for the given key file, failing fast on an unreadable private key
    pub fn new(credentials: ServiceAccountCredentials) -> Result<Self, AuthError> {
        let signing_key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|e| AuthError::InvalidCredential(format!("invalid service account private key: {}", e)))?;

        Ok(Self {
            client_email: credentials.client_email,
            key_id: credentials.private_key_id,
            signing_key,
            token_uri: credentials
                .token_uri
                .unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string()),
            http_client: http_client()?,
            cache: TokenCache::default(),
        })
    }

    /// Use a different token endpoint
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    /// Signed JWT asserting the account's identity to the token endpoint
    fn assertion(&self) -> Result<String, AuthError> {
        let iat = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| AuthError::InvalidCredential(format!("unable to sign assertion: {}", e)))
    }

    async fn refresh(&self) -> Result<AccessToken, AuthError> {
        tracing::debug!(endpoint = %self.token_uri, account = %self.client_email, "requesting service account token");
        let assertion = self.assertion()?;
        let response = self
            .http_client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| request_failed(&self.token_uri, e))?;

        read_token_response(&self.token_uri, response).await
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn get_token(&self) -> Result<AccessToken, AuthError> {
        self.cache.get_or_refresh(|| self.refresh()).await
    }
}

/// Provider matching the kind of credentials file
pub fn provider_for(credentials: Credentials) -> Result<Arc<dyn TokenProvider>, AuthError> {
    Ok(match credentials {
        Credentials::AuthorizedUser(user) => Arc::new(AuthorizedUserTokenProvider::new(user)?),
        Credentials::ServiceAccount(account) => Arc::new(ServiceAccountTokenProvider::new(account)?),
    })
}

/// Provider for the credentials file named by `FIRESTORE_CREDENTIALS`
pub fn provider_from_env() -> Result<Arc<dyn TokenProvider>, AuthError> {
    provider_for(Credentials::from_env()?)
}

/// Provider fetching tokens of the attached service account from the metadata server
pub struct MetadataServerTokenProvider {
    token_uri: String,
    http_client: reqwest::Client,
    cache: TokenCache,
}

impl MetadataServerTokenProvider {
    /// Provider for the default metadata endpoint
    pub fn new() -> Result<Self, AuthError> {
        Ok(Self {
            token_uri: METADATA_TOKEN_URI.to_string(),
            http_client: http_client()?,
            cache: TokenCache::default(),
        })
    }

    /// Use a different metadata endpoint
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    async fn refresh(&self) -> Result<AccessToken, AuthError> {
        tracing::debug!(endpoint = %self.token_uri, "fetching access token from metadata server");
        let response = self
            .http_client
            .get(&self.token_uri)
            .header("Metadata-Flavor", "Google")
            .query(&[("scopes", DATASTORE_SCOPE)])
            .send()
            .await
            .map_err(|e| request_failed(&self.token_uri, e))?;

        read_token_response(&self.token_uri, response).await
    }
}

#[async_trait]
impl TokenProvider for MetadataServerTokenProvider {
    async fn get_token(&self) -> Result<AccessToken, AuthError> {
        self.cache.get_or_refresh(|| self.refresh()).await
    }
}
