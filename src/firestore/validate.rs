//! Request validation
//!
//! Every check runs before a request is built, so an invalid input never
//! reaches the transport. Failures are [`FirebaseError::Input`].

use super::types::{
    ConsistencySelector, ConsistencySelectorFields, GetTarget, ListOrdering, ListQueryFields,
    ListQueryOptions, Operation, OperationFields, Precondition, PreconditionFields,
    TransactionOptions, TransactionOptionsFields, UpdateOptions, UpdateOptionsFields,
};
use crate::error::{FirebaseError, FirebaseResult};

fn input_error<T>(message: impl Into<String>) -> FirebaseResult<T> {
    let message = message.into();
    tracing::debug!(%message, "rejected request options");
    Err(FirebaseError::Input(message))
}

fn is_valid_path(path: &str) -> bool {
    path.starts_with('/') && !path.ends_with('/')
}

/// Path must start with `/` and must not end with `/`
pub fn validate_path(path: &str, name: &str) -> FirebaseResult<()> {
    if !is_valid_path(path) {
        return input_error(format!("{name} must start with and not end with '/'"));
    }
    Ok(())
}

/// [`validate_path`] for the element at `idx` of `container`
pub fn validate_path_at(path: &str, name: &str, idx: usize, container: &str) -> FirebaseResult<()> {
    if !is_valid_path(path) {
        return input_error(format!(
            "{name} at index {idx} of {container} must start with and not end with '/'"
        ));
    }
    Ok(())
}

/// Exactly one of `exists` or `updateTime`
pub fn validate_precondition(fields: PreconditionFields) -> FirebaseResult<Precondition> {
    match (fields.exists, fields.update_time) {
        (Some(exists), None) => Ok(Precondition::Exists(exists)),
        (None, Some(update_time)) if !update_time.is_empty() => Ok(Precondition::UpdateTime(update_time)),
        _ => input_error("only \"exists\" or \"updateTime\" must be specified on currentDocument"),
    }
}

/// Exactly one of `delete`, `update` or `transform`
pub fn validate_single_operation(fields: OperationFields) -> FirebaseResult<Operation> {
    match (fields.delete, fields.update, fields.transform) {
        (Some(path), None, None) => Ok(Operation::Delete(path)),
        (None, Some(update), None) => Ok(Operation::Update(update)),
        (None, None, Some(transform)) => Ok(Operation::Transform(transform)),
        _ => input_error("only one operation mode must be specified"),
    }
}

/// At most one of `orderBy`/`showMissing`, at most one of `transaction`/`readTime`
pub fn validate_list_options(fields: ListQueryFields) -> FirebaseResult<ListQueryOptions> {
    let show_missing = fields.show_missing.unwrap_or(false);

    // Error-first: conflicting ordering
    let ordering = match (fields.order_by, show_missing) {
        (Some(_), true) => {
            return input_error("only one of 'orderBy' or 'showMissing' can be present on queryOptions");
        }
        (Some(order_by), false) => Some(ListOrdering::OrderBy(order_by)),
        (None, true) => Some(ListOrdering::ShowMissing),
        (None, false) => None,
    };

    let consistency_selector = match fields.consistency_selector {
        None => None,
        Some(selector) => {
            if selector.transaction.is_some() && selector.read_time.is_some() {
                return input_error("only one of 'readTime' or 'transaction' can be present on queryOptions");
            }
            let selector = validate_consistency_selector(selector)?;
            validate_list_consistency(Some(&selector))?;
            Some(selector)
        }
    };

    Ok(ListQueryOptions {
        page_size: fields.page_size,
        page_token: fields.page_token,
        ordering,
        consistency_selector,
    })
}

/// A list request can only read in a transaction or at a read time
pub fn validate_list_consistency(selector: Option<&ConsistencySelector>) -> FirebaseResult<()> {
    if let Some(ConsistencySelector::NewTransaction(_)) = selector {
        return input_error("queryOptions consistencySelector can only be one of: transaction | readTime");
    }
    Ok(())
}

/// Exactly one of `fieldsToUpdate` or `updateAll`; `fieldsToUpdate` non-empty
pub fn validate_update_options(fields: UpdateOptionsFields) -> FirebaseResult<UpdateOptions> {
    let update_all = fields.update_all.unwrap_or(false);
    let options = match (fields.fields_to_update, update_all) {
        (Some(_), true) => return input_error("updateOptions must have only one property"),
        (Some(paths), false) => UpdateOptions::FieldsToUpdate(paths),
        (None, true) => UpdateOptions::UpdateAll,
        (None, false) => return input_error("updateOptions must have one of: fieldsToUpdate | updateAll"),
    };
    check_update_options(&options)?;
    Ok(options)
}

/// Checks an already-typed [`UpdateOptions`]
pub fn check_update_options(options: &UpdateOptions) -> FirebaseResult<()> {
    if let UpdateOptions::FieldsToUpdate(paths) = options {
        if paths.is_empty() {
            return input_error("fieldsToUpdate must be a non empty array of field names");
        }
    }
    Ok(())
}

/// Checks an already-typed [`Precondition`]
pub fn check_precondition(precondition: &Precondition) -> FirebaseResult<()> {
    if let Precondition::UpdateTime(update_time) = precondition {
        if update_time.is_empty() {
            return input_error("only \"exists\" or \"updateTime\" must be specified on currentDocument");
        }
    }
    Ok(())
}

/// Exactly one of `transaction`, `newTransaction` or `readTime`
pub fn validate_consistency_selector(fields: ConsistencySelectorFields) -> FirebaseResult<ConsistencySelector> {
    match (fields.transaction, fields.new_transaction, fields.read_time) {
        (Some(transaction), None, None) => Ok(ConsistencySelector::Transaction(transaction)),
        (None, Some(options), None) => Ok(ConsistencySelector::NewTransaction(options)),
        (None, None, Some(read_time)) => Ok(ConsistencySelector::ReadTime(read_time)),
        _ => input_error("consistencySelector can only be one of: transaction | newTransaction | readTime"),
    }
}

/// Exactly one of `readOnly` or `readWrite`
pub fn validate_transaction_options(fields: TransactionOptionsFields) -> FirebaseResult<TransactionOptions> {
    match (fields.read_only, fields.read_write) {
        (Some(read_only), None) => Ok(TransactionOptions::ReadOnly(read_only)),
        (None, Some(read_write)) => Ok(TransactionOptions::ReadWrite(read_write)),
        _ => input_error("transaction options can only be one of: readOnly | readWrite"),
    }
}

/// Exactly one of `collectionPath` or `documentPath`
pub fn validate_get_target(
    collection_path: Option<String>,
    document_path: Option<String>,
) -> FirebaseResult<GetTarget> {
    match (collection_path, document_path) {
        (Some(_), Some(_)) => input_error("only one of collectionPath or documentPath must be specified"),
        (Some(collection_path), None) => Ok(GetTarget::Collection(collection_path)),
        (None, Some(document_path)) => Ok(GetTarget::Document(document_path)),
        (None, None) => input_error("one of collectionPath or documentPath must be specified"),
    }
}

/// Transaction id must be a non-empty string
pub fn validate_transaction_id(transaction: &str) -> FirebaseResult<()> {
    if transaction.is_empty() {
        return input_error("transaction string must be provided");
    }
    Ok(())
}
