//! HTTP transport for the Firestore REST API
//!
//! Operations talk to the backend only through [`Transport`], with paths
//! relative to the database base (`/documents/...`). [`HttpTransport`] is the
//! production implementation; tests substitute an in-memory one.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::Arc;

use super::settings::{DatabaseConfig, Settings};
use crate::auth::token::TokenProvider;
use crate::error::{FirebaseResult, FirestoreError};

/// Request/response exchange with the backend
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET {path}`
    async fn get(&self, path: &str) -> FirebaseResult<Value>;

    /// `POST {path}` with a JSON body
    async fn post(&self, path: &str, body: Value) -> FirebaseResult<Value>;

    /// `PATCH {path}` with a JSON body
    async fn patch(&self, path: &str, body: Value) -> FirebaseResult<Value>;

    /// `DELETE {path}`
    async fn delete(&self, path: &str) -> FirebaseResult<Value>;
}

/// [`Transport`] over `reqwest`, authenticating every request with a bearer token
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token_provider: Arc<dyn TokenProvider>,
}

impl HttpTransport {
    /// Transport for the database described by `config`
    pub fn new(
        config: &DatabaseConfig,
        settings: &Settings,
        token_provider: Arc<dyn TokenProvider>,
    ) -> FirebaseResult<Self> {
        let client = Client::builder().timeout(settings.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: settings.base_url(config),
            token_provider,
        })
    }

    /// Request base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> FirebaseResult<Value> {
        // Token first: an auth failure must not look like a request failure
        let token = self.token_provider.get_token().await?;

        tracing::debug!(%method, %path, "firestore request");
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url).bearer_auth(&token.access_token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        // Handle error responses first
        if !status.is_success() {
            tracing::debug!(%status, %path, "firestore request failed");
            return Err(FirestoreError::from_response(status.as_u16(), &text).into());
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> FirebaseResult<Value> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> FirebaseResult<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> FirebaseResult<Value> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> FirebaseResult<Value> {
        self.send(Method::DELETE, path, None).await
    }
}
