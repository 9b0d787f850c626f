//! Firestore REST SDK
//!
//! Document, query, batch-get and transaction operations against the Cloud
//! Firestore REST API.
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use firestore_rest_sdk::auth::provider_from_env;
//! use firestore_rest_sdk::firestore::{BatchGetOptions, DatabaseConfig, Firestore, Settings};
//!
//! // Service account key or authorized_user file named by FIRESTORE_CREDENTIALS
//! let token_provider = provider_from_env()?;
//! let firestore = Firestore::new(DatabaseConfig::from_env()?, Settings::from_env(), token_provider)?;
//!
//! let result = firestore
//!     .batch_get(BatchGetOptions {
//!         documents: vec!["/users/alice".into(), "/users/bob".into()],
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("found {}, missing {:?}", result.document_count, result.missing);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

// Auth module
pub mod auth {
    //! Access tokens for Firestore requests

    pub mod token;
    pub mod types;

    pub use token::{
        provider_for, provider_from_env, AuthorizedUserTokenProvider, MetadataServerTokenProvider,
        ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider,
    };
    pub use types::{AccessToken, AuthorizedUserCredentials, Credentials, ServiceAccountCredentials};
}

// Firestore module
pub mod firestore;

// Re-exports for convenience
pub use error::{AuthError, FirebaseError, FirebaseResult, FirestoreError};

// Auth re-exports
pub use auth::{StaticTokenProvider, TokenProvider};

// Firestore re-exports
pub use firestore::{DatabaseConfig, Firestore, Settings, WriteBatch};
