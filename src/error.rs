//! Firestore error types
//!
//! Provides a unified error type hierarchy for all document operations.
//!
//! # Taxonomy
//! - [`FirebaseError::Input`] - a request failed validation. Raised before any
//!   network call, never retried.
//! - [`AuthError`] - the token provider could not produce an access token.
//! - [`FirestoreError`] - the backend answered with a non-success status. The
//!   status and message are carried through unmodified.
//!
//! # Design
//! Uses thiserror for ergonomic error definitions. All errors implement
//! std::error::Error and can be converted to FirebaseError via From trait.

use serde::Deserialize;
use thiserror::Error;

/// Result alias used throughout the crate
pub type FirebaseResult<T> = Result<T, FirebaseError>;

/// Top-level error type
///
/// Wraps specific error types (Auth, Firestore, etc.) into a unified type.
/// Supports conversion from all module-specific errors via `From` trait.
///
/// # Example
/// ```
/// use firestore_rest_sdk::{FirebaseError, AuthError};
///
/// let auth_err: FirebaseError = AuthError::CredentialsNotConfigured("FIRESTORE_CREDENTIALS".into()).into();
/// assert!(auth_err.requires_auth());
/// ```
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Request options failed validation; nothing was sent
    #[error("Invalid input: {0}")]
    Input(String),

    /// Authentication-related errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Non-success response from the Firestore backend
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// Network/HTTP errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Authentication errors
///
/// Network failures reaching the token endpoint are kept apart from bad or
/// missing credential material.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Credentials were never configured (e.g. environment variable unset)
    #[error("Credentials not configured: env variable \"{0}\" must be set")]
    CredentialsNotConfigured(String),

    /// Credential material is unreadable, malformed or rejected
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Token endpoint could not be reached (DNS, connect, timeout)
    #[error("Network error: {0}")]
    NetworkRequestFailed(String),

    /// Token endpoint answered without a usable token
    #[error("Token unavailable: {0}")]
    TokenUnavailable(String),
}

/// Firestore errors
///
/// Mirrors the canonical status codes returned by the REST API in the
/// `error.status` field of a failed response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FirestoreError {
    /// Document not found
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Resource already exists
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Precondition on the request failed (e.g. `currentDocument`)
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// Resource exhausted (e.g., quota exceeded)
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Deadline exceeded
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Operation was aborted (e.g. transaction contention)
    #[error("Operation aborted: {0}")]
    Aborted(String),

    /// Out of range error
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Unimplemented feature
    #[error("Feature not implemented: {0}")]
    Unimplemented(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Data loss or corruption
    #[error("Data loss: {0}")]
    DataLoss(String),

    /// Unauthenticated
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Request cancelled
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Any other status, kept verbatim
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Backend message
        message: String,
    },
}

impl FirebaseError {
    /// Create an input validation error
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Create an internal error from a string
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if error was raised by request validation
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    /// Check if error is retryable
    ///
    /// Informational only: no retry is ever attempted by this crate.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_)
            | Self::Auth(AuthError::NetworkRequestFailed(_))
            | Self::Firestore(FirestoreError::Unavailable(_))
            | Self::Firestore(FirestoreError::Aborted(_))
            | Self::Firestore(FirestoreError::DeadlineExceeded(_))
            | Self::Firestore(FirestoreError::ResourceExhausted(_)) => true,
            _ => false,
        }
    }

    /// Check if error indicates authentication is required
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::CredentialsNotConfigured(_))
                | Self::Auth(AuthError::InvalidCredential(_))
                | Self::Firestore(FirestoreError::Unauthenticated(_))
        )
    }
}

/// Body of a failed REST call: `{"error": {"code", "message", "status"}}`
#[derive(Debug, Deserialize)]
struct RestErrorBody {
    error: RestErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RestErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl FirestoreError {
    /// Create from a canonical status string (`NOT_FOUND`, `ABORTED`, ...)
    pub fn from_status(status: &str, message: impl Into<String>) -> Option<Self> {
        let message = message.into();
        let err = match status {
            "CANCELLED" => Self::Cancelled(message),
            "INVALID_ARGUMENT" => Self::InvalidArgument(message),
            "DEADLINE_EXCEEDED" => Self::DeadlineExceeded(message),
            "NOT_FOUND" => Self::NotFound(message),
            "ALREADY_EXISTS" => Self::AlreadyExists(message),
            "PERMISSION_DENIED" => Self::PermissionDenied(message),
            "RESOURCE_EXHAUSTED" => Self::ResourceExhausted(message),
            "FAILED_PRECONDITION" => Self::FailedPrecondition(message),
            "ABORTED" => Self::Aborted(message),
            "OUT_OF_RANGE" => Self::OutOfRange(message),
            "UNIMPLEMENTED" => Self::Unimplemented(message),
            "INTERNAL" => Self::Internal(message),
            "UNAVAILABLE" => Self::Unavailable(message),
            "DATA_LOSS" => Self::DataLoss(message),
            "UNAUTHENTICATED" => Self::Unauthenticated(message),
            _ => return None,
        };
        Some(err)
    }

    /// Create from a canonical numeric code
    pub fn from_code(code: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            1 => Self::Cancelled(message),
            3 => Self::InvalidArgument(message),
            4 => Self::DeadlineExceeded(message),
            5 => Self::NotFound(message),
            6 => Self::AlreadyExists(message),
            7 => Self::PermissionDenied(message),
            8 => Self::ResourceExhausted(message),
            9 => Self::FailedPrecondition(message),
            10 => Self::Aborted(message),
            11 => Self::OutOfRange(message),
            12 => Self::Unimplemented(message),
            13 => Self::Internal(message),
            14 => Self::Unavailable(message),
            15 => Self::DataLoss(message),
            16 => Self::Unauthenticated(message),
            _ => Self::Http {
                status: 500,
                message,
            },
        }
    }

    /// Create from a failed HTTP response
    ///
    /// Uses the `error.status` string of the REST error body when present,
    /// otherwise keeps the HTTP status and raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let Ok(parsed) = serde_json::from_str::<RestErrorBody>(body) else {
            return Self::Http {
                status,
                message: body.to_string(),
            };
        };
        let RestErrorDetail { message, status: code } = parsed.error;
        match Self::from_status(&code, message.clone()) {
            Some(err) => err,
            None => Self::Http { status, message },
        }
    }
}
