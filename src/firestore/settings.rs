//! Firestore Settings and database configuration
//!
//! [`DatabaseConfig`] names the database every request targets; [`Settings`]
//! describes how to reach the backend. Both are immutable once a
//! [`Firestore`](super::Firestore) client is built and are shared read-only
//! across calls.

use std::time::Duration;

use crate::error::{FirebaseError, FirebaseResult};

/// Environment variable naming the project id
pub const PROJECT_ID_ENV: &str = "FIRESTORE_PROJECT_ID";

/// Environment variable naming the database id
pub const DATABASE_ID_ENV: &str = "FIRESTORE_DATABASE_ID";

/// Environment variable pointing at a local emulator (`host:port`)
pub const EMULATOR_HOST_ENV: &str = "FIRESTORE_EMULATOR_HOST";

/// Identity of the database all operations target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    project_id: String,
    database_id: String,
}

impl DatabaseConfig {
    /// Database id used when none is given
    pub const DEFAULT_DATABASE: &'static str = "(default)";

    /// Config for the default database of a project
    pub fn new(project_id: impl Into<String>) -> FirebaseResult<Self> {
        Self::with_database(project_id, Self::DEFAULT_DATABASE)
    }

    /// Config for a named database
    pub fn with_database(
        project_id: impl Into<String>,
        database_id: impl Into<String>,
    ) -> FirebaseResult<Self> {
        let project_id = project_id.into();
        let database_id = database_id.into();

        // Validate options (error case first)
        if project_id.is_empty() {
            return Err(FirebaseError::internal("Project ID cannot be empty"));
        }
        if database_id.is_empty() {
            return Err(FirebaseError::internal("Database ID cannot be empty"));
        }

        Ok(Self {
            project_id,
            database_id,
        })
    }

    /// Read `FIRESTORE_PROJECT_ID` and optional `FIRESTORE_DATABASE_ID`
    pub fn from_env() -> FirebaseResult<Self> {
        let project_id = std::env::var(PROJECT_ID_ENV).map_err(|_| {
            FirebaseError::internal(format!("env variable \"{PROJECT_ID_ENV}\" must be set"))
        })?;
        match std::env::var(DATABASE_ID_ENV) {
            Ok(database_id) if !database_id.is_empty() => Self::with_database(project_id, database_id),
            _ => Self::new(project_id),
        }
    }

    /// Get the project ID
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Get the database ID
    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// `projects/{project}/databases/{database}`
    pub fn database_path(&self) -> String {
        format!("projects/{}/databases/{}", self.project_id, self.database_id)
    }

    /// Prefix for absolute document resource names
    ///
    /// Format: `projects/{project}/databases/{database}/documents`
    pub fn document_base_path(&self) -> String {
        format!("{}/documents", self.database_path())
    }
}

/// Settings for reaching the Firestore backend
#[derive(Debug, Clone)]
pub struct Settings {
    /// Host of the Firestore backend to connect to
    ///
    /// Default: "firestore.googleapis.com"
    pub host: String,

    /// Whether to use SSL for communication
    ///
    /// Default: true
    pub ssl_enabled: bool,

    /// REST API version segment
    ///
    /// Default: "v1"
    pub api_version: String,

    /// Timeout applied by the HTTP client to each request
    ///
    /// Default: 30 seconds
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "firestore.googleapis.com".to_string(),
            ssl_enabled: true,
            api_version: "v1".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Settings {
    /// Creates default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings targeting a local emulator over plain HTTP
    pub fn emulator(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ssl_enabled: false,
            ..Self::default()
        }
    }

    /// Default settings, switched to the emulator when `FIRESTORE_EMULATOR_HOST` is set
    pub fn from_env() -> Self {
        match std::env::var(EMULATOR_HOST_ENV) {
            Ok(host) if !host.is_empty() => Self::emulator(host),
            _ => Self::default(),
        }
    }

    /// Request base: `{scheme}://{host}/{version}/projects/{p}/databases/{d}`
    pub fn base_url(&self, config: &DatabaseConfig) -> String {
        let scheme = if self.ssl_enabled { "https" } else { "http" };
        format!(
            "{}://{}/{}/{}",
            scheme,
            self.host.trim_end_matches('/'),
            self.api_version,
            config.database_path()
        )
    }
}
