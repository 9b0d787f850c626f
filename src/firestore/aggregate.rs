//! Folding of streamed `batchGet` and `runQuery` responses
//!
//! Both endpoints answer with an ordered array of items. [`ResponseAggregator`]
//! folds them left to right into one result:
//!
//! - documents are appended in arrival order, each tagged with its item's
//!   `readTime`
//! - `missing` names are collected verbatim
//! - `readTime`: first non-empty value wins
//! - `transaction`: last non-empty value wins
//! - `skippedResults`: latest non-zero value wins

use serde::Deserialize;
use serde_json::Value;

use super::field_value::parse_document;
use super::types::{BatchGetResult, Document, QueryResult};
use crate::error::FirebaseResult;

/// One item of a `batchGet` response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetResponseItem {
    /// Document that exists
    #[serde(default)]
    pub found: Option<Value>,
    /// Resource name with no document
    #[serde(default)]
    pub missing: Option<String>,
    /// Time the document was read
    #[serde(default)]
    pub read_time: Option<String>,
    /// Transaction started by this request
    #[serde(default)]
    pub transaction: Option<String>,
}

/// One item of a `runQuery` response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponseItem {
    /// Matching document
    #[serde(default)]
    pub document: Option<Value>,
    /// Time the document was read
    #[serde(default)]
    pub read_time: Option<String>,
    /// Results skipped due to offset since the last item
    #[serde(default)]
    pub skipped_results: Option<i64>,
    /// Transaction started by this request
    #[serde(default)]
    pub transaction: Option<String>,
}

/// Running state of a response fold
#[derive(Debug, Default)]
pub struct ResponseAggregator {
    documents: Vec<Document>,
    missing: Vec<String>,
    read_time: Option<String>,
    transaction: Option<String>,
    skipped_results: i64,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

impl ResponseAggregator {
    /// Empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    fn push_document(&mut self, wire: Value, read_time: Option<&str>) -> FirebaseResult<()> {
        let mut document = parse_document(wire)?;
        if document.read_time.is_none() {
            document.read_time = read_time.map(str::to_string);
        }
        self.documents.push(document);
        Ok(())
    }

    fn observe_read_time(&mut self, read_time: Option<String>) {
        if self.read_time.is_none() {
            self.read_time = non_empty(read_time);
        }
    }

    fn observe_transaction(&mut self, transaction: Option<String>) {
        if let Some(transaction) = non_empty(transaction) {
            self.transaction = Some(transaction);
        }
    }

    /// Fold one `batchGet` item
    pub fn fold_batch_get(&mut self, item: BatchGetResponseItem) -> FirebaseResult<()> {
        if let Some(found) = item.found {
            self.push_document(found, item.read_time.as_deref())?;
        }
        if let Some(missing) = item.missing {
            self.missing.push(missing);
        }
        self.observe_read_time(item.read_time);
        self.observe_transaction(item.transaction);
        Ok(())
    }

    /// Fold one `runQuery` item
    pub fn fold_query(&mut self, item: RunQueryResponseItem) -> FirebaseResult<()> {
        if let Some(document) = item.document {
            self.push_document(document, item.read_time.as_deref())?;
        }
        if let Some(skipped) = item.skipped_results.filter(|skipped| *skipped != 0) {
            self.skipped_results = skipped;
        }
        self.observe_read_time(item.read_time);
        self.observe_transaction(item.transaction);
        Ok(())
    }

    /// Finish as a `batchGet` result
    pub fn into_batch_get_result(self) -> BatchGetResult {
        BatchGetResult {
            document_count: self.documents.len(),
            documents: self.documents,
            missing: self.missing,
            read_time: self.read_time,
            transaction: self.transaction,
        }
    }

    /// Finish as a `runQuery` result
    pub fn into_query_result(self) -> QueryResult {
        QueryResult {
            document_count: self.documents.len(),
            documents: self.documents,
            read_time: self.read_time,
            skipped_results: self.skipped_results,
            transaction: self.transaction,
        }
    }
}

/// Fold a whole `batchGet` response
pub fn aggregate_batch_get(items: Vec<BatchGetResponseItem>) -> FirebaseResult<BatchGetResult> {
    let mut aggregator = ResponseAggregator::new();
    for item in items {
        aggregator.fold_batch_get(item)?;
    }
    Ok(aggregator.into_batch_get_result())
}

/// Fold a whole `runQuery` response
pub fn aggregate_query(items: Vec<RunQueryResponseItem>) -> FirebaseResult<QueryResult> {
    let mut aggregator = ResponseAggregator::new();
    for item in items {
        aggregator.fold_query(item)?;
    }
    Ok(aggregator.into_query_result())
}
