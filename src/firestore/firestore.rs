//! Firestore REST client
//!
//! [`Firestore`] holds the immutable database configuration and the
//! transport every operation goes through. It is cheap to clone and safe to
//! share across tasks; calls are independent of each other.

use std::sync::Arc;

use super::settings::{DatabaseConfig, Settings};
use super::transport::{HttpTransport, Transport};
use super::write_batch::WriteBatch;
use crate::auth::token::TokenProvider;
use crate::error::FirebaseResult;

/// Firestore database client
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use firestore_rest_sdk::auth::token::StaticTokenProvider;
/// # use firestore_rest_sdk::firestore::{DatabaseConfig, Firestore, GetDocumentOptions, Settings};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DatabaseConfig::new("project-id")?;
/// let settings = Settings::emulator("localhost:8080");
/// let firestore = Firestore::new(config, settings, Arc::new(StaticTokenProvider::emulator()))?;
///
/// let user = firestore.get(GetDocumentOptions::document("/users/alice")).await?;
/// println!("{:?}", user);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Firestore {
    pub(crate) inner: Arc<FirestoreInner>,
}

pub(crate) struct FirestoreInner {
    pub(crate) config: DatabaseConfig,
    /// `projects/{p}/databases/{d}/documents`, prefix of absolute resource names
    pub(crate) document_base_path: String,
    pub(crate) transport: Arc<dyn Transport>,
}

impl Firestore {
    /// Create a client talking HTTP to the backend described by `settings`
    ///
    /// The token provider is owned by the client from here on and asked for a
    /// token before every request.
    pub fn new(
        config: DatabaseConfig,
        settings: Settings,
        token_provider: Arc<dyn TokenProvider>,
    ) -> FirebaseResult<Self> {
        let transport = HttpTransport::new(&config, &settings, token_provider)?;
        tracing::debug!(
            project_id = %config.project_id(),
            database_id = %config.database_id(),
            base_url = %transport.base_url(),
            "created firestore client"
        );
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over any [`Transport`]
    pub fn with_transport(config: DatabaseConfig, transport: Arc<dyn Transport>) -> Self {
        let document_base_path = config.document_base_path();
        Self {
            inner: Arc::new(FirestoreInner {
                config,
                document_base_path,
                transport,
            }),
        }
    }

    /// Get the project ID
    pub fn project_id(&self) -> &str {
        self.inner.config.project_id()
    }

    /// Get the database ID
    pub fn database_id(&self) -> &str {
        self.inner.config.database_id()
    }

    /// Prefix of absolute document resource names
    pub fn document_base_path(&self) -> &str {
        &self.inner.document_base_path
    }

    /// Create a new write batch
    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new(self.clone())
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }
}

impl std::fmt::Debug for Firestore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firestore")
            .field("project_id", &self.project_id())
            .field("database_id", &self.database_id())
            .finish()
    }
}
