//! Document operations
//!
//! Each operation validates its options, builds the request path and body,
//! performs exactly one request and normalizes the response. Invalid options
//! never reach the transport.

use serde_json::{json, Map, Value};

use super::aggregate::{aggregate_batch_get, aggregate_query, BatchGetResponseItem, RunQueryResponseItem};
use super::field_value::parse_document;
use super::firestore::Firestore;
use super::path::{
    append_precondition, append_query_param, append_repeated_query_param, documents_path, method_path,
    resource_name,
};
use super::types::{
    BatchGetOptions, BatchGetResult, CollectionIds, ConsistencySelector, CreateDocumentOptions,
    DeleteDocumentOptions, DeleteResult, Document, DocumentList, GetDocumentOptions, GetResult, GetTarget,
    ListDocumentsOptions, ListOrdering, ListResult, ListCollectionIdsOptions, QueryResult, RunQueryOptions,
    UpdateDocumentOptions,
};
use super::validate::{
    check_precondition, check_update_options, validate_list_consistency, validate_path, validate_path_at,
};
use crate::error::{FirebaseError, FirebaseResult};

const MASK: &str = "mask.fieldPaths";
const UPDATE_MASK: &str = "updateMask.fieldPaths";

fn append_mask(path: String, fields_to_return: Option<&Vec<String>>) -> String {
    match fields_to_return {
        Some(fields) => append_repeated_query_param(&path, MASK, fields),
        None => path,
    }
}

/// Parse the `documents` array of a list-shaped response
fn parse_documents(response: &mut Value) -> FirebaseResult<Vec<Document>> {
    match response.get_mut("documents").map(Value::take) {
        Some(Value::Array(documents)) => documents.into_iter().map(parse_document).collect(),
        _ => Ok(Vec::new()),
    }
}

fn take_page_token(response: &mut Value) -> Option<String> {
    match response.get_mut("nextPageToken").map(Value::take) {
        Some(Value::String(token)) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Merge a consistency selector into a request body (`{..., "transaction": "..."}`)
pub(crate) fn merge_selector(
    body: &mut Map<String, Value>,
    selector: Option<&ConsistencySelector>,
) -> FirebaseResult<()> {
    let Some(selector) = selector else {
        return Ok(());
    };
    match serde_json::to_value(selector)? {
        Value::Object(fields) => {
            body.extend(fields);
            Ok(())
        }
        other => Err(FirebaseError::internal(format!(
            "consistency selector serialized to {other}"
        ))),
    }
}

impl Firestore {
    /// Create a document in a collection
    ///
    /// `POST /documents{collectionPath}[?documentId=...][&mask.fieldPaths=...]`
    pub async fn create(&self, options: CreateDocumentOptions) -> FirebaseResult<Document> {
        validate_path(&options.collection_path, "collectionPath")?;

        let mut path = documents_path(&options.collection_path);
        if let Some(doc_id) = options.doc_id.as_deref().filter(|id| !id.is_empty()) {
            path = append_query_param(&path, "documentId", doc_id);
        }
        path = append_mask(path, options.fields_to_return.as_ref());

        let body = serde_json::to_value(&options.data)?;
        let response = self.transport().post(&path, body).await?;
        parse_document(response)
    }

    /// Read one document, or every document of a collection
    pub async fn get(&self, options: GetDocumentOptions) -> FirebaseResult<GetResult> {
        match &options.target {
            GetTarget::Collection(collection_path) => {
                validate_path(collection_path, "collectionPath")?;
                let path = append_mask(documents_path(collection_path), options.fields_to_return.as_ref());

                let mut response = self.transport().get(&path).await?;
                let documents = parse_documents(&mut response)?;
                Ok(GetResult::Collection(DocumentList {
                    document_count: documents.len(),
                    documents,
                }))
            }
            GetTarget::Document(document_path) => {
                validate_path(document_path, "documentPath")?;
                let path = append_mask(documents_path(document_path), options.fields_to_return.as_ref());

                let response = self.transport().get(&path).await?;
                Ok(GetResult::Document(parse_document(response)?))
            }
        }
    }

    /// List documents of a collection, one page at a time
    ///
    /// Query parameters are appended in the order `pageToken, pageSize,
    /// orderBy, showMissing, transaction, readTime, mask.fieldPaths`.
    pub async fn list(&self, options: ListDocumentsOptions) -> FirebaseResult<ListResult> {
        let query = &options.query_options;
        validate_path(&options.collection_path, "collectionPath")?;
        validate_list_consistency(query.consistency_selector.as_ref())?;

        let mut path = documents_path(&options.collection_path);
        if let Some(page_token) = query.page_token.as_deref().filter(|token| !token.is_empty()) {
            path = append_query_param(&path, "pageToken", page_token);
        }
        if let Some(page_size) = query.page_size.filter(|size| *size > 0) {
            path = append_query_param(&path, "pageSize", &page_size.to_string());
        }
        match &query.ordering {
            Some(ListOrdering::OrderBy(order_by)) => {
                path = append_query_param(&path, "orderBy", order_by);
            }
            Some(ListOrdering::ShowMissing) => {
                path = append_query_param(&path, "showMissing", "true");
            }
            None => {}
        }
        match &query.consistency_selector {
            Some(ConsistencySelector::Transaction(transaction)) => {
                path = append_query_param(&path, "transaction", transaction);
            }
            Some(ConsistencySelector::ReadTime(read_time)) => {
                path = append_query_param(&path, "readTime", read_time);
            }
            // Rejected above
            Some(ConsistencySelector::NewTransaction(_)) | None => {}
        }
        path = append_mask(path, options.fields_to_return.as_ref());

        let mut response = self.transport().get(&path).await?;
        let documents = parse_documents(&mut response)?;
        Ok(ListResult {
            document_count: documents.len(),
            documents,
            next_page_token: take_page_token(&mut response),
        })
    }

    /// List the ids of the collections directly under a document
    pub async fn list_collection_ids(&self, options: ListCollectionIdsOptions) -> FirebaseResult<CollectionIds> {
        validate_path(&options.document_path, "documentPath")?;

        let path = method_path(Some(&options.document_path), "listCollectionIds");
        let body = serde_json::to_value(&options)?;
        let response = self.transport().post(&path, body).await?;

        let mut ids: CollectionIds = serde_json::from_value(response)?;
        ids.id_count = ids.collection_ids.len();
        ids.next_page_token = ids.next_page_token.filter(|token| !token.is_empty());
        Ok(ids)
    }

    /// Delete a document
    pub async fn delete(&self, options: DeleteDocumentOptions) -> FirebaseResult<DeleteResult> {
        validate_path(&options.document_path, "documentPath")?;

        let mut path = documents_path(&options.document_path);
        if let Some(precondition) = &options.current_document {
            check_precondition(precondition)?;
            path = append_precondition(&path, precondition);
        }

        self.transport().delete(&path).await?;
        Ok(DeleteResult { deleted: true })
    }

    /// Update fields of a document
    ///
    /// The update mask comes from `update_options`: the explicit field list, or
    /// every top-level key of `data.fields` for `UpdateAll`.
    pub async fn update(&self, options: UpdateDocumentOptions) -> FirebaseResult<Document> {
        validate_path(&options.document_path, "documentPath")?;
        check_update_options(&options.update_options)?;

        let mut path = documents_path(&options.document_path);
        if let Some(precondition) = &options.current_document {
            check_precondition(precondition)?;
            path = append_precondition(&path, precondition);
        }
        let update_mask = options.update_options.mask(&options.data.fields);
        path = append_repeated_query_param(&path, UPDATE_MASK, &update_mask);
        path = append_mask(path, options.fields_to_return.as_ref());

        let body = serde_json::to_value(&options.data)?;
        let response = self.transport().patch(&path, body).await?;
        parse_document(response)
    }

    /// Run a structured query, from the root or under a document
    pub async fn run_query(&self, options: RunQueryOptions) -> FirebaseResult<QueryResult> {
        if let Some(document_path) = &options.document_path {
            validate_path(document_path, "documentPath")?;
        }

        let path = method_path(options.document_path.as_deref(), "runQuery");
        let mut body = Map::new();
        body.insert(
            "structuredQuery".to_string(),
            serde_json::to_value(&options.structured_query)?,
        );
        merge_selector(&mut body, options.consistency_selector.as_ref())?;

        let response = self.transport().post(&path, Value::Object(body)).await?;
        let items: Vec<RunQueryResponseItem> = serde_json::from_value(response)?;
        aggregate_query(items)
    }

    /// Read several documents in one request
    ///
    /// Found documents keep response order; paths with no document are
    /// reported in `missing`.
    pub async fn batch_get(&self, options: BatchGetOptions) -> FirebaseResult<BatchGetResult> {
        let documents = options
            .documents
            .iter()
            .enumerate()
            .map(|(idx, document_path)| {
                validate_path_at(document_path, "documentPath", idx, "documents")?;
                Ok(resource_name(self.document_base_path(), document_path))
            })
            .collect::<FirebaseResult<Vec<String>>>()?;

        let mut body = Map::new();
        body.insert("documents".to_string(), json!(documents));
        if let Some(fields) = &options.fields_to_return {
            body.insert("mask".to_string(), json!({ "fieldPaths": fields }));
        }
        merge_selector(&mut body, options.consistency_selector.as_ref())?;

        let path = method_path(None, "batchGet");
        let response = self.transport().post(&path, Value::Object(body)).await?;
        let items: Vec<BatchGetResponseItem> = serde_json::from_value(response)?;
        aggregate_batch_get(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::testing::recording_client;
    use crate::firestore::types::{
        CollectionSelector, DocumentData, ListQueryOptions, Precondition, StructuredQuery, TransactionOptions,
        UpdateOptions,
    };

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn wire_doc(path: &str) -> Value {
        json!({
            "name": format!("projects/p/databases/(default)/documents{path}"),
            "fields": {"a": {"integerValue": "1"}},
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_create_with_doc_id_and_mask() {
        let (firestore, transport) = recording_client();
        transport.respond_with(wire_doc("/users/alice"));

        let doc = firestore
            .create(CreateDocumentOptions {
                collection_path: "/users".into(),
                doc_id: Some("alice".into()),
                data: DocumentData::new(fields(json!({"a": {"integerValue": "1"}}))),
                fields_to_return: Some(vec!["a".into(), "b".into()]),
            })
            .await
            .unwrap();

        assert_eq!(doc.get("a"), Some(&json!(1)));
        let request = transport.last_request();
        assert_eq!(request.method, "POST");
        assert_eq!(
            request.path,
            "/documents/users?documentId=alice&mask.fieldPaths=a&mask.fieldPaths=b"
        );
        assert_eq!(request.body, Some(json!({"fields": {"a": {"integerValue": "1"}}})));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_collection_path() {
        let (firestore, transport) = recording_client();
        let result = firestore
            .create(CreateDocumentOptions {
                collection_path: "users/".into(),
                ..Default::default()
            })
            .await;

        assert!(result.unwrap_err().is_input_error());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_get_collection_without_documents() {
        let (firestore, transport) = recording_client();
        let result = firestore.get(GetDocumentOptions::collection("/users")).await.unwrap();

        assert_eq!(result, GetResult::Collection(DocumentList::default()));
        assert_eq!(transport.last_request().path, "/documents/users");
    }

    #[tokio::test]
    async fn test_get_document() {
        let (firestore, transport) = recording_client();
        transport.respond_with(wire_doc("/users/alice"));

        let mut options = GetDocumentOptions::document("/users/alice");
        options.fields_to_return = Some(vec!["a".into()]);
        let result = firestore.get(options).await.unwrap();

        match result {
            GetResult::Document(doc) => assert_eq!(doc.id(), "alice"),
            other => panic!("Expected document, got {other:?}"),
        }
        assert_eq!(transport.last_request().path, "/documents/users/alice?mask.fieldPaths=a");
    }

    #[tokio::test]
    async fn test_list_parameter_order() {
        let (firestore, transport) = recording_client();
        transport.respond_with(json!({
            "documents": [wire_doc("/users/alice"), wire_doc("/users/bob")],
            "nextPageToken": "next"
        }));

        let result = firestore
            .list(ListDocumentsOptions {
                collection_path: "/users".into(),
                fields_to_return: Some(vec!["a".into()]),
                query_options: ListQueryOptions {
                    page_size: Some(2),
                    page_token: Some("tok".into()),
                    ordering: Some(ListOrdering::OrderBy("age".into())),
                    consistency_selector: Some(ConsistencySelector::ReadTime("T".into())),
                },
            })
            .await
            .unwrap();

        assert_eq!(result.document_count, 2);
        assert_eq!(result.next_page_token.as_deref(), Some("next"));
        assert_eq!(
            transport.last_request().path,
            "/documents/users?pageToken=tok&pageSize=2&orderBy=age&readTime=T&mask.fieldPaths=a"
        );
    }

    #[tokio::test]
    async fn test_list_empty_collection() {
        let (firestore, transport) = recording_client();
        let result = firestore
            .list(ListDocumentsOptions {
                collection_path: "/users".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.document_count, 0);
        assert!(result.next_page_token.is_none());
        assert_eq!(transport.last_request().path, "/documents/users");
    }

    #[tokio::test]
    async fn test_list_rejects_new_transaction() {
        let (firestore, transport) = recording_client();
        let result = firestore
            .list(ListDocumentsOptions {
                collection_path: "/users".into(),
                query_options: ListQueryOptions {
                    consistency_selector: Some(ConsistencySelector::NewTransaction(TransactionOptions::read_only())),
                    ..Default::default()
                },
                ..Default::default()
            })
            .await;

        assert!(result.unwrap_err().is_input_error());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_list_collection_ids() {
        let (firestore, transport) = recording_client();
        transport.respond_with(json!({"collectionIds": ["orders", "reviews"]}));

        let ids = firestore
            .list_collection_ids(ListCollectionIdsOptions {
                document_path: "/users/alice".into(),
                page_size: Some(10),
                page_token: None,
            })
            .await
            .unwrap();

        assert_eq!(ids.id_count, 2);
        let request = transport.last_request();
        assert_eq!(request.path, "/documents/users/alice:listCollectionIds");
        assert_eq!(request.body, Some(json!({"pageSize": 10})));
    }

    #[tokio::test]
    async fn test_list_collection_ids_none() {
        let (firestore, _transport) = recording_client();
        let ids = firestore
            .list_collection_ids(ListCollectionIdsOptions {
                document_path: "/users/alice".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(ids.id_count, 0);
        assert!(ids.collection_ids.is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_preconditions() {
        let (firestore, transport) = recording_client();

        let result = firestore
            .delete(DeleteDocumentOptions {
                document_path: "/users/alice".into(),
                current_document: Some(Precondition::Exists(false)),
            })
            .await
            .unwrap();
        assert!(result.deleted);
        assert_eq!(
            transport.last_request().path,
            "/documents/users/alice?currentDocument.exists=false"
        );

        firestore
            .delete(DeleteDocumentOptions {
                document_path: "/users/alice".into(),
                current_document: Some(Precondition::UpdateTime("T".into())),
            })
            .await
            .unwrap();
        assert_eq!(
            transport.last_request().path,
            "/documents/users/alice?currentDocument.updateTime=T"
        );

        firestore
            .delete(DeleteDocumentOptions {
                document_path: "/users/alice".into(),
                current_document: None,
            })
            .await
            .unwrap();
        assert_eq!(transport.last_request().method, "DELETE");
        assert_eq!(transport.last_request().path, "/documents/users/alice");
    }

    #[tokio::test]
    async fn test_update_all_mask_keeps_insertion_order() {
        let (firestore, transport) = recording_client();
        transport.respond_with(wire_doc("/users/alice"));

        firestore
            .update(UpdateDocumentOptions {
                document_path: "/users/alice".into(),
                data: DocumentData::new(fields(json!({
                    "zeta": {"integerValue": "1"},
                    "alpha": {"integerValue": "2"}
                }))),
                fields_to_return: None,
                update_options: UpdateOptions::UpdateAll,
                current_document: None,
            })
            .await
            .unwrap();

        assert_eq!(
            transport.last_request().path,
            "/documents/users/alice?updateMask.fieldPaths=zeta&updateMask.fieldPaths=alpha"
        );
    }

    #[tokio::test]
    async fn test_update_all_derives_mask_from_fields() {
        let (firestore, transport) = recording_client();
        transport.respond_with(wire_doc("/users/alice"));

        firestore
            .update(UpdateDocumentOptions {
                document_path: "/users/alice".into(),
                data: DocumentData::new(fields(json!({
                    "a": {"integerValue": "1"},
                    "b": {"integerValue": "2"}
                }))),
                fields_to_return: Some(vec!["a".into()]),
                update_options: UpdateOptions::UpdateAll,
                current_document: Some(Precondition::Exists(true)),
            })
            .await
            .unwrap();

        let request = transport.last_request();
        assert_eq!(request.method, "PATCH");
        assert_eq!(
            request.path,
            "/documents/users/alice?currentDocument.exists=true&updateMask.fieldPaths=a&updateMask.fieldPaths=b&mask.fieldPaths=a"
        );
    }

    #[tokio::test]
    async fn test_update_rejects_empty_field_list() {
        let (firestore, transport) = recording_client();
        let result = firestore
            .update(UpdateDocumentOptions {
                document_path: "/users/alice".into(),
                data: DocumentData::default(),
                fields_to_return: None,
                update_options: UpdateOptions::FieldsToUpdate(Vec::new()),
                current_document: None,
            })
            .await;

        assert!(result.unwrap_err().is_input_error());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_run_query_body_and_fold() {
        let (firestore, transport) = recording_client();
        transport.respond_with(json!([
            {"document": wire_doc("/cities/1"), "readTime": "T1", "transaction": "tx"},
            {"skippedResults": 3},
            {"document": wire_doc("/cities/2"), "readTime": "T2"}
        ]));

        let result = firestore
            .run_query(RunQueryOptions {
                document_path: Some("/regions/west".into()),
                structured_query: StructuredQuery {
                    from: vec![CollectionSelector {
                        collection_id: "cities".into(),
                        all_descendants: false,
                    }],
                    ..Default::default()
                },
                consistency_selector: Some(ConsistencySelector::NewTransaction(TransactionOptions::read_only())),
            })
            .await
            .unwrap();

        assert_eq!(result.document_count, 2);
        assert_eq!(result.read_time.as_deref(), Some("T1"));
        assert_eq!(result.skipped_results, 3);
        assert_eq!(result.transaction.as_deref(), Some("tx"));

        let request = transport.last_request();
        assert_eq!(request.path, "/documents/regions/west:runQuery");
        assert_eq!(
            request.body,
            Some(json!({
                "structuredQuery": {"from": [{"collectionId": "cities"}]},
                "newTransaction": {"readOnly": {}}
            }))
        );
    }

    #[tokio::test]
    async fn test_run_query_from_root() {
        let (firestore, transport) = recording_client();
        transport.respond_with(json!([{"readTime": "T0"}]));

        let result = firestore.run_query(RunQueryOptions::default()).await.unwrap();
        assert_eq!(result.document_count, 0);
        assert_eq!(transport.last_request().path, "/documents:runQuery");
    }

    #[tokio::test]
    async fn test_batch_get_rewrites_paths() {
        let (firestore, transport) = recording_client();
        transport.respond_with(json!([
            {"found": wire_doc("/col/1"), "readTime": "T1"},
            {"missing": "projects/p/databases/(default)/documents/col/2", "readTime": "T1"}
        ]));

        let result = firestore
            .batch_get(BatchGetOptions {
                documents: vec!["/col/1".into(), "/col/2".into()],
                fields_to_return: Some(vec!["a".into()]),
                consistency_selector: Some(ConsistencySelector::Transaction("tx".into())),
            })
            .await
            .unwrap();

        assert_eq!(result.document_count, 1);
        assert_eq!(result.missing.len(), 1);

        let request = transport.last_request();
        assert_eq!(request.path, "/documents:batchGet");
        assert_eq!(
            request.body,
            Some(json!({
                "documents": [
                    "projects/p/databases/(default)/documents/col/1",
                    "projects/p/databases/(default)/documents/col/2"
                ],
                "mask": {"fieldPaths": ["a"]},
                "transaction": "tx"
            }))
        );
    }

    #[tokio::test]
    async fn test_batch_get_names_bad_index() {
        let (firestore, transport) = recording_client();
        let result = firestore
            .batch_get(BatchGetOptions {
                documents: vec!["/col/1".into(), "col/2".into()],
                ..Default::default()
            })
            .await;

        match result {
            Err(FirebaseError::Input(message)) => assert!(message.contains("at index 1 of documents")),
            other => panic!("Expected input error, got {other:?}"),
        }
        assert!(transport.requests().is_empty());
    }
}
