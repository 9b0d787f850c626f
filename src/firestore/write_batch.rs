//! Firestore WriteBatch type
//!
//! Accumulates writes and commits them atomically in one request, with or
//! without a transaction.

use super::firestore::Firestore;
use super::types::{CommitResponse, FieldTransform, Fields, Precondition, UpdateOptions, Write};
use crate::error::FirebaseResult;

/// Write batch for atomic operations
///
/// # Example
/// ```no_run
/// # use firestore_rest_sdk::firestore::{Firestore, Precondition};
/// # async fn example(firestore: Firestore) -> Result<(), Box<dyn std::error::Error>> {
/// let response = firestore
///     .batch()
///     .set("/cities/LA", serde_json::Map::new())
///     .delete_if("/cities/SF", Precondition::Exists(true))
///     .commit()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WriteBatch {
    writes: Vec<Write>,
    firestore: Firestore,
}

impl WriteBatch {
    pub(crate) fn new(firestore: Firestore) -> Self {
        Self {
            writes: Vec::new(),
            firestore,
        }
    }

    /// Add an arbitrary write
    pub fn write(mut self, write: Write) -> Self {
        self.writes.push(write);
        self
    }

    /// Replace the whole document with `fields`
    pub fn set(self, document_path: impl Into<String>, fields: Fields) -> Self {
        self.write(Write::update(document_path, fields))
    }

    /// Update the top-level fields present in `fields`; the document must exist
    pub fn update(self, document_path: impl Into<String>, fields: Fields) -> Self {
        self.write(
            Write::update(document_path, fields)
                .with_update_options(UpdateOptions::UpdateAll)
                .with_precondition(Precondition::Exists(true)),
        )
    }

    /// Update exactly `field_paths`
    pub fn update_fields(
        self,
        document_path: impl Into<String>,
        fields: Fields,
        field_paths: Vec<String>,
    ) -> Self {
        self.write(
            Write::update(document_path, fields).with_update_options(UpdateOptions::FieldsToUpdate(field_paths)),
        )
    }

    /// Delete a document
    pub fn delete(self, document_path: impl Into<String>) -> Self {
        self.write(Write::delete(document_path))
    }

    /// Delete a document if `precondition` holds
    pub fn delete_if(self, document_path: impl Into<String>, precondition: Precondition) -> Self {
        self.write(Write::delete(document_path).with_precondition(precondition))
    }

    /// Apply server-side field transforms
    pub fn transform(self, document_path: impl Into<String>, field_transforms: Vec<FieldTransform>) -> Self {
        self.write(Write::transform(document_path, field_transforms))
    }

    /// Commit outside any transaction
    ///
    /// # Errors
    /// Returns an input error for an empty batch or an invalid write; no
    /// request is sent in that case.
    pub async fn commit(self) -> FirebaseResult<CommitResponse> {
        self.firestore.commit_writes(None, &self.writes).await
    }

    /// Commit inside `transaction`
    pub async fn commit_in(self, transaction: &str) -> FirebaseResult<CommitResponse> {
        self.firestore.commit(transaction, self.writes).await
    }

    /// Writes added so far, in commit order
    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    /// Check if batch is empty
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Get number of writes
    pub fn len(&self) -> usize {
        self.writes.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::firestore::testing::recording_client;
    use crate::firestore::types::{Fields, Operation, Precondition, TransformType};
    use crate::firestore::FieldTransform;
    use serde_json::json;

    #[test]
    fn test_builder_keeps_order() {
        let (firestore, _transport) = recording_client();
        let batch = firestore
            .batch()
            .delete("/cities/NYC")
            .set("/cities/LA", Fields::new())
            .transform(
                "/counters/c",
                vec![FieldTransform::new("n", TransformType::Increment(json!({"integerValue": "1"})))],
            );

        assert_eq!(batch.len(), 3);
        assert!(matches!(batch.writes()[0].operation, Operation::Delete(_)));
        assert!(matches!(batch.writes()[1].operation, Operation::Update(_)));
        assert!(matches!(batch.writes()[2].operation, Operation::Transform(_)));
    }

    #[tokio::test]
    async fn test_commit_without_transaction() {
        let (firestore, transport) = recording_client();
        let mut fields = Fields::new();
        fields.insert("a".into(), json!({"integerValue": "1"}));

        firestore
            .batch()
            .update("/cities/LA", fields)
            .delete_if("/cities/SF", Precondition::Exists(true))
            .commit()
            .await
            .unwrap();

        let body = transport.last_request().body.unwrap();
        assert!(body.get("transaction").is_none());
        assert_eq!(
            body["writes"][0],
            json!({
                "currentDocument": {"exists": true},
                "updateMask": {"fieldPaths": ["a"]},
                "update": {
                    "name": "projects/p/databases/(default)/documents/cities/LA",
                    "fields": {"a": {"integerValue": "1"}}
                }
            })
        );
        assert_eq!(body["writes"][1]["currentDocument"], json!({"exists": true}));
    }

    #[tokio::test]
    async fn test_commit_in_transaction() {
        let (firestore, transport) = recording_client();
        firestore.batch().delete("/cities/LA").commit_in("tx-9").await.unwrap();

        let body = transport.last_request().body.unwrap();
        assert_eq!(body["transaction"], json!("tx-9"));
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let (firestore, transport) = recording_client();
        let result = firestore.batch().commit().await;

        assert!(result.unwrap_err().is_input_error());
        assert!(transport.requests().is_empty());
    }
}
