//! Resource path and query string construction
//!
//! Paths handed to these functions are expected to be validated already
//! (see [`validate`](super::validate)). Query parameters are appended in
//! the order callers apply them; list requests use
//! `pageToken, pageSize, orderBy, showMissing, transaction, readTime,
//! mask.fieldPaths*`.
//!
//! Values are percent-encoded only where they would otherwise change the
//! meaning of the query (`%`, `&`, `#`, `+`, space, non-ASCII).

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use super::types::Precondition;

/// Characters escaped in query parameter values
const QUERY_VALUE: &AsciiSet = &CONTROLS.add(b' ').add(b'%').add(b'&').add(b'#').add(b'+');

/// Relative path of the documents root
pub const DOCUMENTS: &str = "/documents";

/// `{base}{sub_path}`
///
/// `sub_path` must start with `/` and not end with `/`.
pub fn resource_path(base: &str, sub_path: &str) -> String {
    format!("{base}{sub_path}")
}

/// `/documents{sub_path}`
pub fn documents_path(sub_path: &str) -> String {
    resource_path(DOCUMENTS, sub_path)
}

/// `/documents:{method}` or `/documents{sub_path}:{method}`
pub fn method_path(sub_path: Option<&str>, method: &str) -> String {
    match sub_path {
        Some(sub_path) => format!("{}:{method}", documents_path(sub_path)),
        None => format!("{DOCUMENTS}:{method}"),
    }
}

/// Absolute resource name of a document: `{document_base}{document_path}`
pub fn resource_name(document_base: &str, document_path: &str) -> String {
    resource_path(document_base, document_path)
}

fn push_pair(path: &mut String, key: &str, value: &str) {
    path.push_str(key);
    path.push('=');
    path.extend(utf8_percent_encode(value, QUERY_VALUE));
}

fn push_separator(path: &mut String) {
    if !path.contains('?') {
        path.push('?');
    }
    if !path.ends_with('?') {
        path.push('&');
    }
}

/// Append `key=value`, starting the query with `?` and continuing with `&`
pub fn append_query_param(path: &str, key: &str, value: &str) -> String {
    let mut path = path.to_string();
    push_separator(&mut path);
    push_pair(&mut path, key, value);
    path
}

/// Append one `key=value` per element, preserving element order
///
/// An empty `values` slice leaves the path unchanged.
pub fn append_repeated_query_param<S: AsRef<str>>(path: &str, key: &str, values: &[S]) -> String {
    if values.is_empty() {
        return path.to_string();
    }

    let mut path = path.to_string();
    push_separator(&mut path);
    for value in values {
        push_pair(&mut path, key, value.as_ref());
        path.push('&');
    }
    if path.ends_with('&') {
        path.pop();
    }
    path
}

/// Append the `currentDocument.*` parameter for a precondition
pub fn append_precondition(path: &str, precondition: &Precondition) -> String {
    match precondition {
        Precondition::Exists(exists) => {
            append_query_param(path, "currentDocument.exists", if *exists { "true" } else { "false" })
        }
        Precondition::UpdateTime(update_time) => {
            append_query_param(path, "currentDocument.updateTime", update_time)
        }
    }
}
