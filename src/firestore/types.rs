//! Firestore request options and results
//!
//! Mutually exclusive option shapes are enums. Each enum also has a loose
//! `*Fields` form mirroring the JSON option objects callers may hold; the
//! loose form converts through [`validate`](super::validate) via `TryFrom`,
//! and serde deserialization of the enum goes through the same path.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::validate;
use crate::error::FirebaseError;

/// Field mapping of a document
pub type Fields = Map<String, Value>;

/// Document body supplied by the caller
///
/// `fields` hold typed wire values (`{"stringValue": "..."}`) and are sent as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentData {
    /// Resource name, usually left empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Typed wire values keyed by field name
    #[serde(default)]
    pub fields: Fields,
}

impl DocumentData {
    /// Document body from typed wire fields
    pub fn new(fields: Fields) -> Self {
        Self { name: None, fields }
    }
}

/// Document returned by the backend, with fields converted to plain values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Absolute resource name
    pub name: String,
    /// Plain field values
    pub fields: Fields,
    /// Creation timestamp (opaque)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// Last update timestamp (opaque)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    /// Snapshot time, set on documents read through batch-get or query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<String>,
}

impl Document {
    /// Get a field value by name
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Document ID (last segment of the resource name)
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Condition a write must satisfy to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PreconditionFields")]
pub enum Precondition {
    /// Document must (or must not) exist
    Exists(bool),
    /// Document must have been last updated at this time
    UpdateTime(String),
}

/// Loose form of [`Precondition`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreconditionFields {
    /// `exists` condition
    pub exists: Option<bool>,
    /// `updateTime` condition
    pub update_time: Option<String>,
}

impl TryFrom<PreconditionFields> for Precondition {
    type Error = FirebaseError;

    fn try_from(fields: PreconditionFields) -> Result<Self, Self::Error> {
        validate::validate_precondition(fields)
    }
}

/// How the update mask of an update is derived
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "UpdateOptionsFields")]
pub enum UpdateOptions {
    /// Update exactly these field paths
    FieldsToUpdate(Vec<String>),
    /// Update every top-level field present in the supplied data
    UpdateAll,
}

/// Loose form of [`UpdateOptions`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOptionsFields {
    /// Explicit field paths
    pub fields_to_update: Option<Vec<String>>,
    /// Use all top-level keys
    pub update_all: Option<bool>,
}

impl TryFrom<UpdateOptionsFields> for UpdateOptions {
    type Error = FirebaseError;

    fn try_from(fields: UpdateOptionsFields) -> Result<Self, Self::Error> {
        validate::validate_update_options(fields)
    }
}

impl UpdateOptions {
    /// Field paths of the update mask for `fields`
    pub fn mask(&self, fields: &Fields) -> Vec<String> {
        match self {
            UpdateOptions::FieldsToUpdate(paths) => paths.clone(),
            UpdateOptions::UpdateAll => fields.keys().cloned().collect(),
        }
    }
}

/// Transaction mode for `beginTransaction` and `newTransaction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TransactionOptionsFields")]
pub enum TransactionOptions {
    /// Read-only transaction
    ReadOnly(ReadOnlyOptions),
    /// Read-write transaction
    ReadWrite(ReadWriteOptions),
}

impl TransactionOptions {
    /// Read-only transaction reading at the latest time
    pub fn read_only() -> Self {
        Self::ReadOnly(ReadOnlyOptions::default())
    }

    /// Read-write transaction
    pub fn read_write() -> Self {
        Self::ReadWrite(ReadWriteOptions::default())
    }
}

/// Options of a read-only transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOnlyOptions {
    /// Read documents at this time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<String>,
}

/// Options of a read-write transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadWriteOptions {
    /// Transaction being retried
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_transaction: Option<String>,
}

/// Loose form of [`TransactionOptions`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOptionsFields {
    /// Read-only mode
    pub read_only: Option<ReadOnlyOptions>,
    /// Read-write mode
    pub read_write: Option<ReadWriteOptions>,
}

impl TryFrom<TransactionOptionsFields> for TransactionOptions {
    type Error = FirebaseError;

    fn try_from(fields: TransactionOptionsFields) -> Result<Self, Self::Error> {
        validate::validate_transaction_options(fields)
    }
}

/// Snapshot semantics of a read
///
/// Serializes to the wire shape, e.g. `{"transaction": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ConsistencySelectorFields")]
pub enum ConsistencySelector {
    /// Read inside an existing transaction
    Transaction(String),
    /// Start a new transaction for this read
    NewTransaction(TransactionOptions),
    /// Read at a point in time
    ReadTime(String),
}

/// Loose form of [`ConsistencySelector`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencySelectorFields {
    /// Existing transaction id
    pub transaction: Option<String>,
    /// New transaction mode
    pub new_transaction: Option<TransactionOptions>,
    /// Read time
    pub read_time: Option<String>,
}

impl TryFrom<ConsistencySelectorFields> for ConsistencySelector {
    type Error = FirebaseError;

    fn try_from(fields: ConsistencySelectorFields) -> Result<Self, Self::Error> {
        validate::validate_consistency_selector(fields)
    }
}

/// Server value for `setToServerValue`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerValue {
    /// Time the server processed the request
    RequestTime,
}

/// Array payload of the array transforms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    /// Typed wire values
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Server-side mutation of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformType {
    /// Set to a server-computed value
    SetToServerValue(ServerValue),
    /// Add the given typed numeric value
    Increment(Value),
    /// Keep the larger of current and given value
    Maximum(Value),
    /// Keep the smaller of current and given value
    Minimum(Value),
    /// Append elements not already present
    AppendMissingElements(ArrayValue),
    /// Remove all given elements
    RemoveAllFromArray(ArrayValue),
}

/// Field transform as supplied by callers: `{fieldPath, transformType: {<kind>: payload}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    /// Field path the transform applies to
    pub field_path: String,
    /// Transform kind and payload
    pub transform_type: TransformType,
}

impl FieldTransform {
    /// Transform of `field_path`
    pub fn new(field_path: impl Into<String>, transform_type: TransformType) -> Self {
        Self {
            field_path: field_path.into(),
            transform_type,
        }
    }
}

/// Target of an `update` write
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdate {
    /// Document path (`/collection/doc`)
    pub document_path: String,
    /// Typed wire values
    #[serde(default)]
    pub fields: Fields,
}

/// Target of a `transform` write
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTransform {
    /// Document path (`/collection/doc`)
    pub document_path: String,
    /// Transforms applied in order
    pub field_transforms: Vec<FieldTransform>,
}

/// Operation kind of a write
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "OperationFields")]
pub enum Operation {
    /// Delete the document at this path
    Delete(String),
    /// Write fields of a document
    Update(DocumentUpdate),
    /// Apply server-side field transforms
    Transform(DocumentTransform),
}

/// Loose form of [`Operation`]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationFields {
    /// Delete target
    pub delete: Option<String>,
    /// Update target
    pub update: Option<DocumentUpdate>,
    /// Transform target
    pub transform: Option<DocumentTransform>,
}

impl TryFrom<OperationFields> for Operation {
    type Error = FirebaseError;

    fn try_from(fields: OperationFields) -> Result<Self, Self::Error> {
        validate::validate_single_operation(fields)
    }
}

/// One write of a commit
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    /// What the write does
    pub operation: Operation,
    /// Precondition the document must satisfy
    #[serde(default)]
    pub current_document: Option<Precondition>,
    /// Update mask derivation; only valid with an update operation
    #[serde(default)]
    pub update_options: Option<UpdateOptions>,
}

impl Write {
    fn with_operation(operation: Operation) -> Self {
        Self {
            operation,
            current_document: None,
            update_options: None,
        }
    }

    /// Delete the document at `document_path`
    pub fn delete(document_path: impl Into<String>) -> Self {
        Self::with_operation(Operation::Delete(document_path.into()))
    }

    /// Write `fields` to the document at `document_path`
    pub fn update(document_path: impl Into<String>, fields: Fields) -> Self {
        Self::with_operation(Operation::Update(DocumentUpdate {
            document_path: document_path.into(),
            fields,
        }))
    }

    /// Apply `field_transforms` to the document at `document_path`
    pub fn transform(document_path: impl Into<String>, field_transforms: Vec<FieldTransform>) -> Self {
        Self::with_operation(Operation::Transform(DocumentTransform {
            document_path: document_path.into(),
            field_transforms,
        }))
    }

    /// Attach a precondition
    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.current_document = Some(precondition);
        self
    }

    /// Attach update mask options
    pub fn with_update_options(mut self, update_options: UpdateOptions) -> Self {
        self.update_options = Some(update_options);
        self
    }
}

/// Collection a structured query reads from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    /// Collection id
    pub collection_id: String,
    /// Include all descendant collections with this id
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub all_descendants: bool,
}

/// Structured query, passed through to the backend uninterpreted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    /// Projection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Value>,
    /// Collections to query
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<CollectionSelector>,
    /// Filter
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Value>,
    /// Start cursor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<Value>,
    /// End cursor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<Value>,
    /// Results to skip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i32>,
    /// Maximum results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

/// Options of `create`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentOptions {
    /// Parent collection path (`/collection`)
    pub collection_path: String,
    /// Client-assigned document id
    #[serde(default)]
    pub doc_id: Option<String>,
    /// Document body
    pub data: DocumentData,
    /// Fields to return in the response
    #[serde(default)]
    pub fields_to_return: Option<Vec<String>>,
}

/// What `get` reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetTarget {
    /// Every document of a collection
    Collection(String),
    /// A single document
    Document(String),
}

/// Options of `get`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "GetDocumentFields")]
pub struct GetDocumentOptions {
    /// Collection or document
    pub target: GetTarget,
    /// Fields to return
    pub fields_to_return: Option<Vec<String>>,
}

impl GetDocumentOptions {
    /// Read one document
    pub fn document(document_path: impl Into<String>) -> Self {
        Self {
            target: GetTarget::Document(document_path.into()),
            fields_to_return: None,
        }
    }

    /// Read a whole collection
    pub fn collection(collection_path: impl Into<String>) -> Self {
        Self {
            target: GetTarget::Collection(collection_path.into()),
            fields_to_return: None,
        }
    }
}

/// Loose form of [`GetDocumentOptions`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDocumentFields {
    /// Collection path
    pub collection_path: Option<String>,
    /// Document path
    pub document_path: Option<String>,
    /// Fields to return
    pub fields_to_return: Option<Vec<String>>,
}

impl TryFrom<GetDocumentFields> for GetDocumentOptions {
    type Error = FirebaseError;

    fn try_from(fields: GetDocumentFields) -> Result<Self, Self::Error> {
        let target = validate::validate_get_target(fields.collection_path, fields.document_path)?;
        Ok(Self {
            target,
            fields_to_return: fields.fields_to_return,
        })
    }
}

/// Ordering of a list request; `orderBy` and `showMissing` exclude each other
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOrdering {
    /// Sort by this field
    OrderBy(String),
    /// Include missing documents
    ShowMissing,
}

/// Query options of `list`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ListQueryFields")]
pub struct ListQueryOptions {
    /// Maximum documents per page
    pub page_size: Option<u32>,
    /// Token from a previous page
    pub page_token: Option<String>,
    /// `orderBy` or `showMissing`
    pub ordering: Option<ListOrdering>,
    /// Transaction or read time; `newTransaction` is rejected
    pub consistency_selector: Option<ConsistencySelector>,
}

/// Loose form of [`ListQueryOptions`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQueryFields {
    /// Maximum documents per page
    pub page_size: Option<u32>,
    /// Token from a previous page
    pub page_token: Option<String>,
    /// Sort field
    pub order_by: Option<String>,
    /// Include missing documents
    pub show_missing: Option<bool>,
    /// Transaction or read time
    pub consistency_selector: Option<ConsistencySelectorFields>,
}

impl TryFrom<ListQueryFields> for ListQueryOptions {
    type Error = FirebaseError;

    fn try_from(fields: ListQueryFields) -> Result<Self, Self::Error> {
        validate::validate_list_options(fields)
    }
}

/// Options of `list`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsOptions {
    /// Collection path (`/collection`)
    pub collection_path: String,
    /// Fields to return
    #[serde(default)]
    pub fields_to_return: Option<Vec<String>>,
    /// Paging, ordering and consistency
    #[serde(default)]
    pub query_options: ListQueryOptions,
}

/// Options of `listCollectionIds`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCollectionIdsOptions {
    /// Parent document path
    #[serde(skip_serializing)]
    pub document_path: String,
    /// Maximum ids per page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Token from a previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

/// Options of `delete`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDocumentOptions {
    /// Document path
    pub document_path: String,
    /// Precondition
    #[serde(default)]
    pub current_document: Option<Precondition>,
}

/// Options of `update`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentOptions {
    /// Document path
    pub document_path: String,
    /// Document body
    pub data: DocumentData,
    /// Fields to return
    #[serde(default)]
    pub fields_to_return: Option<Vec<String>>,
    /// Update mask derivation
    pub update_options: UpdateOptions,
    /// Precondition
    #[serde(default)]
    pub current_document: Option<Precondition>,
}

/// Options of `runQuery`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryOptions {
    /// Parent document path; `None` queries from the root
    #[serde(default)]
    pub document_path: Option<String>,
    /// The query
    pub structured_query: StructuredQuery,
    /// Snapshot semantics
    #[serde(default)]
    pub consistency_selector: Option<ConsistencySelector>,
}

/// Options of `batchGet`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetOptions {
    /// Document paths, each `/collection/doc`
    pub documents: Vec<String>,
    /// Fields to return
    #[serde(default)]
    pub fields_to_return: Option<Vec<String>>,
    /// Snapshot semantics
    #[serde(default)]
    pub consistency_selector: Option<ConsistencySelector>,
}

/// Documents of a collection read through `get`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentList {
    /// Parsed documents
    pub documents: Vec<Document>,
    /// Number of documents
    pub document_count: usize,
}

/// Result of `get`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GetResult {
    /// A single document
    Document(Document),
    /// A collection
    Collection(DocumentList),
}

/// Result of `list`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult {
    /// Parsed documents
    pub documents: Vec<Document>,
    /// Number of documents (0 when none returned)
    pub document_count: usize,
    /// Token of the next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Result of `listCollectionIds`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionIds {
    /// Collection ids
    #[serde(default)]
    pub collection_ids: Vec<String>,
    /// Number of ids (0 when none returned)
    #[serde(default)]
    pub id_count: usize,
    /// Token of the next page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Result of `delete`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    /// Always true on success
    pub deleted: bool,
}

/// Result of `batchGet`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetResult {
    /// Found documents in arrival order
    pub documents: Vec<Document>,
    /// Number of found documents
    pub document_count: usize,
    /// Resource names with no document
    pub missing: Vec<String>,
    /// First read time seen
    pub read_time: Option<String>,
    /// Last transaction id seen
    pub transaction: Option<String>,
}

/// Result of `runQuery`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Documents in arrival order
    pub documents: Vec<Document>,
    /// Number of documents
    pub document_count: usize,
    /// First read time seen
    pub read_time: Option<String>,
    /// Latest non-zero skipped count
    pub skipped_results: i64,
    /// Last transaction id seen
    pub transaction: Option<String>,
}

/// Result of `beginTransaction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginTransactionResponse {
    /// Opaque transaction id
    pub transaction: String,
}

/// Result of `rollBack`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackResult {
    /// Always true on success
    pub rolled_back: bool,
}

/// Outcome of one write of a commit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    /// Last update time of the document after the write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    /// Results of field transforms, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transform_results: Vec<Value>,
}

/// Result of `commit`, as returned by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    /// One result per write, in request order
    #[serde(default)]
    pub write_results: Vec<WriteResult>,
    /// Time the commit applied
    #[serde(default)]
    pub commit_time: Option<String>,
}
