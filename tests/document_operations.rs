//! Document operations against a mock HTTP backend

use firestore_rest_sdk::firestore::{
    BatchGetOptions, DatabaseConfig, DocumentData, Fields, Firestore, ListDocumentsOptions, ListQueryOptions,
    RunQueryOptions, Settings, UpdateDocumentOptions, UpdateOptions, Write,
};
use firestore_rest_sdk::firestore::types::ListQueryFields;
use firestore_rest_sdk::{FirebaseError, FirestoreError, StaticTokenProvider};
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::{json, Value};
use std::sync::Arc;

const DB: &str = "/v1/projects/demo/databases/(default)";
const BASE: &str = "projects/demo/databases/(default)/documents";

fn client(server: &MockServer) -> Firestore {
    let config = DatabaseConfig::new("demo").unwrap();
    let settings = Settings::emulator(server.address().to_string());
    Firestore::new(config, settings, Arc::new(StaticTokenProvider::emulator())).unwrap()
}

fn wire_doc(path: &str, n: i64) -> Value {
    json!({
        "name": format!("{BASE}{path}"),
        "fields": {"n": {"integerValue": n.to_string()}},
        "createTime": "2024-01-01T00:00:00Z",
        "updateTime": "2024-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn test_list_with_order_by_and_show_missing_sends_nothing() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.path_contains("/documents");
            then.status(200).json_body(json!({}));
        })
        .await;

    // Conflicting options are rejected while building the options
    let query_options = ListQueryOptions::try_from(ListQueryFields {
        order_by: Some("name".into()),
        show_missing: Some(true),
        ..Default::default()
    });
    let err = query_options.unwrap_err();
    assert!(err.is_input_error());

    // and again when the same options arrive as JSON
    let parsed = serde_json::from_value::<ListDocumentsOptions>(json!({
        "collectionPath": "/users",
        "queryOptions": {"orderBy": "name", "showMissing": true}
    }));
    assert!(parsed.is_err());

    let result = client(&server)
        .list(ListDocumentsOptions {
            collection_path: "users".into(),
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(FirebaseError::Input(_))));
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_update_all_sends_mask_of_top_level_keys() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path(format!("{DB}/documents/users/alice"))
                .query_param("updateMask.fieldPaths", "a")
                .query_param("updateMask.fieldPaths", "b")
                .header("authorization", "Bearer owner");
            then.status(200).json_body(wire_doc("/users/alice", 1));
        })
        .await;

    let mut fields = Fields::new();
    fields.insert("a".into(), json!({"integerValue": "1"}));
    fields.insert("b".into(), json!({"integerValue": "2"}));

    let doc = client(&server)
        .update(UpdateDocumentOptions {
            document_path: "/users/alice".into(),
            data: DocumentData::new(fields),
            fields_to_return: None,
            update_options: UpdateOptions::UpdateAll,
            current_document: None,
        })
        .await
        .unwrap();

    assert_eq!(doc.get("n"), Some(&json!(1)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_commit_preserves_write_order() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{DB}/documents:commit")).json_body(json!({
                "transaction": "tx-1",
                "writes": [
                    {"delete": format!("{BASE}/x")},
                    {"update": {"name": format!("{BASE}/y"), "fields": {"a": {"integerValue": "1"}}}}
                ]
            }));
            then.status(200).json_body(json!({
                "writeResults": [{"updateTime": "T1"}, {"updateTime": "T1"}],
                "commitTime": "T1"
            }));
        })
        .await;

    let writes: Vec<Write> = serde_json::from_value(json!([
        {"operation": {"delete": "/x"}},
        {"operation": {"update": {"documentPath": "/y", "fields": {"a": {"integerValue": "1"}}}}}
    ]))
    .unwrap();

    let response = client(&server).commit("tx-1", writes).await.unwrap();
    assert_eq!(response.write_results.len(), 2);
    assert_eq!(response.commit_time.as_deref(), Some("T1"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_batch_get_found_and_missing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{DB}/documents:batchGet")).json_body(json!({
                "documents": [format!("{BASE}/col/1"), format!("{BASE}/col/2")]
            }));
            then.status(200).json_body(json!([
                {"found": wire_doc("/col/1", 1), "readTime": "T1"},
                {"missing": "/col/2", "readTime": "T1"}
            ]));
        })
        .await;

    let result = client(&server)
        .batch_get(BatchGetOptions {
            documents: vec!["/col/1".into(), "/col/2".into()],
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(result.document_count, 1);
    assert_eq!(result.documents[0].id(), "1");
    assert_eq!(result.missing, vec!["/col/2".to_string()]);
}

#[tokio::test]
async fn test_run_query_fold() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{DB}/documents:runQuery"));
            then.status(200).json_body(json!([
                {"document": wire_doc("/cities/1", 1), "readTime": "T1"},
                {"skippedResults": 3},
                {"document": wire_doc("/cities/2", 2), "readTime": "T2"}
            ]));
        })
        .await;

    let result = client(&server).run_query(RunQueryOptions::default()).await.unwrap();

    let ids: Vec<&str> = result.documents.iter().map(|doc| doc.id()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert_eq!(result.document_count, 2);
    assert_eq!(result.read_time.as_deref(), Some("T1"));
    assert_eq!(result.skipped_results, 3);
}

#[tokio::test]
async fn test_backend_error_passed_through() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{DB}/documents/users"));
            then.status(403).json_body(json!({
                "error": {"code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED"}
            }));
        })
        .await;

    let result = client(&server)
        .list(ListDocumentsOptions {
            collection_path: "/users".into(),
            ..Default::default()
        })
        .await;

    match result {
        Err(FirebaseError::Firestore(FirestoreError::PermissionDenied(message))) => {
            assert_eq!(message, "Missing or insufficient permissions.")
        }
        other => panic!("Expected PermissionDenied, got {:?}", other),
    }
}
