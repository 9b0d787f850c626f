//! Transactions and commit assembly
//!
//! A transaction is an opaque id owned by the backend: begin it, read with
//! `ConsistencySelector::Transaction`, then commit or roll back. Nothing is
//! tracked locally.
//!
//! # Example
//! ```no_run
//! # use firestore_rest_sdk::firestore::{Firestore, TransactionOptions, Write};
//! # async fn example(firestore: Firestore) -> Result<(), Box<dyn std::error::Error>> {
//! let begun = firestore.begin_transaction(TransactionOptions::read_write()).await?;
//!
//! let writes = vec![
//!     Write::delete("/cities/LA"),
//!     Write::update("/cities/SF", serde_json::Map::new()),
//! ];
//! let response = firestore.commit(&begun.transaction, writes).await?;
//! println!("committed at {:?}", response.commit_time);
//! # Ok(())
//! # }
//! ```

use serde_json::{json, Map, Value};

use super::firestore::Firestore;
use super::path::{method_path, resource_name};
use super::types::{
    BeginTransactionResponse, CommitResponse, FieldTransform, Operation, RollbackResult, TransactionOptions,
    Write,
};
use super::validate::{check_precondition, check_update_options, validate_path, validate_transaction_id};
use crate::error::{FirebaseError, FirebaseResult};

/// `{fieldPath, <kind>: payload}`: the transform kind tag is lifted into the transform itself
fn flatten_field_transform(transform: &FieldTransform) -> FirebaseResult<Value> {
    let mut flat = Map::new();
    flat.insert("fieldPath".to_string(), Value::String(transform.field_path.clone()));
    match serde_json::to_value(&transform.transform_type)? {
        Value::Object(kind) => flat.extend(kind),
        other => {
            return Err(FirebaseError::internal(format!(
                "field transform serialized to {other}"
            )));
        }
    }
    Ok(Value::Object(flat))
}

/// Convert one [`Write`] to its wire form
///
/// Document paths are validated and rewritten to absolute resource names.
/// The result holds `currentDocument` and `updateMask` when given, plus
/// exactly one of `delete`, `update` or `transform`.
pub(crate) fn assemble_write(document_base: &str, write: &Write) -> FirebaseResult<Value> {
    let mut wire = Map::new();

    let (key, operation) = match &write.operation {
        Operation::Delete(document_path) => {
            validate_path(document_path, "documentPath")?;
            ("delete", Value::String(resource_name(document_base, document_path)))
        }
        Operation::Transform(transform) => {
            validate_path(&transform.document_path, "documentPath")?;
            let field_transforms = transform
                .field_transforms
                .iter()
                .map(flatten_field_transform)
                .collect::<FirebaseResult<Vec<Value>>>()?;
            (
                "transform",
                json!({
                    "document": resource_name(document_base, &transform.document_path),
                    "fieldTransforms": field_transforms,
                }),
            )
        }
        Operation::Update(update) => {
            validate_path(&update.document_path, "documentPath")?;
            (
                "update",
                json!({
                    "name": resource_name(document_base, &update.document_path),
                    "fields": update.fields,
                }),
            )
        }
    };

    if let Some(update_options) = &write.update_options {
        let Operation::Update(update) = &write.operation else {
            return Err(FirebaseError::input(
                "updateOptions can only be provided with an update operation",
            ));
        };
        check_update_options(update_options)?;
        wire.insert(
            "updateMask".to_string(),
            json!({ "fieldPaths": update_options.mask(&update.fields) }),
        );
    }

    if let Some(precondition) = &write.current_document {
        check_precondition(precondition)?;
        wire.insert("currentDocument".to_string(), serde_json::to_value(precondition)?);
    }

    wire.insert(key.to_string(), operation);
    Ok(Value::Object(wire))
}

/// Convert writes to wire form, keeping their order
///
/// The backend applies writes in array order, so the output order is the input order.
pub(crate) fn assemble_writes(document_base: &str, writes: &[Write]) -> FirebaseResult<Vec<Value>> {
    // Validate writes (error case first)
    if writes.is_empty() {
        return Err(FirebaseError::input(
            "At least one write operation must be provided in the writes array",
        ));
    }
    writes
        .iter()
        .map(|write| assemble_write(document_base, write))
        .collect()
}

impl Firestore {
    /// Begin a transaction
    pub async fn begin_transaction(&self, options: TransactionOptions) -> FirebaseResult<BeginTransactionResponse> {
        let path = method_path(None, "beginTransaction");
        let body = json!({ "options": options });
        let response = self.transport().post(&path, body).await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Roll back a transaction
    pub async fn roll_back(&self, transaction: &str) -> FirebaseResult<RollbackResult> {
        validate_transaction_id(transaction)?;

        let path = method_path(None, "rollback");
        self.transport()
            .post(&path, json!({ "transaction": transaction }))
            .await?;
        Ok(RollbackResult { rolled_back: true })
    }

    /// Commit `writes` inside a transaction
    ///
    /// Returns the backend's write results and commit time unmodified.
    pub async fn commit(&self, transaction: &str, writes: Vec<Write>) -> FirebaseResult<CommitResponse> {
        validate_transaction_id(transaction)?;
        self.commit_writes(Some(transaction), &writes).await
    }

    /// Commit `writes`, in a transaction when `transaction` is given
    pub(crate) async fn commit_writes(
        &self,
        transaction: Option<&str>,
        writes: &[Write],
    ) -> FirebaseResult<CommitResponse> {
        let writes = assemble_writes(self.document_base_path(), writes)?;

        let mut body = Map::new();
        if let Some(transaction) = transaction {
            body.insert("transaction".to_string(), Value::String(transaction.to_string()));
        }
        body.insert("writes".to_string(), Value::Array(writes));

        let path = method_path(None, "commit");
        let response = self.transport().post(&path, Value::Object(body)).await?;
        Ok(serde_json::from_value(response)?)
    }
}
