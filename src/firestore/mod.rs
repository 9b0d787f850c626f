//! Cloud Firestore over REST
//!
//! # Module Structure
//! - `settings.rs`: database identity and connection settings
//! - `types.rs`: option, write and result types
//! - `validate.rs`: option checks run before any request
//! - `path.rs`: resource paths and query strings
//! - `field_value.rs`: typed wire values to plain JSON
//! - `aggregate.rs`: folding of batch-get and query responses
//! - `transport.rs`: HTTP transport
//! - `firestore.rs`: the client
//! - `documents.rs`: document operations
//! - `transaction.rs`: transactions and commit assembly
//! - `write_batch.rs`: batched writes

pub mod aggregate;
pub mod documents;
pub mod field_value;
pub mod path;
pub mod settings;
pub mod transport;
pub mod types;
pub mod validate;
pub mod write_batch;

// Core modules
/// Firestore REST client
pub mod firestore;
/// Transaction support for atomic multi-write commits
pub mod transaction;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main Firestore client
pub use firestore::Firestore;

// Re-export from settings module
pub use settings::{DatabaseConfig, Settings};

// Re-export from transport module
pub use transport::{HttpTransport, Transport};

// Re-export from aggregate module
pub use aggregate::{BatchGetResponseItem, ResponseAggregator, RunQueryResponseItem};

// Re-export from write_batch module
pub use write_batch::WriteBatch;

// Re-export option and result types
pub use types::{
    ArrayValue, BatchGetOptions, BatchGetResult, BeginTransactionResponse, CollectionIds, CollectionSelector,
    CommitResponse, ConsistencySelector, CreateDocumentOptions, DeleteDocumentOptions, DeleteResult, Document,
    DocumentData, DocumentList, FieldTransform, Fields, GetDocumentOptions, GetResult, GetTarget,
    ListCollectionIdsOptions, ListDocumentsOptions, ListOrdering, ListQueryOptions, ListResult, Operation,
    Precondition, QueryResult, ReadOnlyOptions, ReadWriteOptions, RollbackResult, RunQueryOptions,
    ServerValue, StructuredQuery, TransactionOptions, TransformType, UpdateDocumentOptions, UpdateOptions,
    Write, WriteResult,
};
