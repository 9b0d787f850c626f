//! In-memory transport for unit tests

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::firestore::Firestore;
use super::settings::DatabaseConfig;
use super::transport::Transport;
use crate::error::FirebaseResult;

/// Request seen by [`RecordingTransport`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub(crate) method: &'static str,
    pub(crate) path: String,
    pub(crate) body: Option<Value>,
}

/// Records every request and answers with queued responses (`{}` when none are queued)
#[derive(Default)]
pub(crate) struct RecordingTransport {
    requests: Mutex<Vec<RecordedRequest>>,
    responses: Mutex<VecDeque<Value>>,
}

impl RecordingTransport {
    pub(crate) fn respond_with(&self, response: Value) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request was recorded")
    }

    fn record(&self, method: &'static str, path: &str, body: Option<Value>) -> FirebaseResult<Value> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path: path.to_string(),
            body,
        });
        Ok(self.responses.lock().unwrap().pop_front().unwrap_or_else(|| json!({})))
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get(&self, path: &str) -> FirebaseResult<Value> {
        self.record("GET", path, None)
    }

    async fn post(&self, path: &str, body: Value) -> FirebaseResult<Value> {
        self.record("POST", path, Some(body))
    }

    async fn patch(&self, path: &str, body: Value) -> FirebaseResult<Value> {
        self.record("PATCH", path, Some(body))
    }

    async fn delete(&self, path: &str) -> FirebaseResult<Value> {
        self.record("DELETE", path, None)
    }
}

/// Client for project `p` over a fresh recording transport
pub(crate) fn recording_client() -> (Firestore, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let config = DatabaseConfig::new("p").unwrap();
    let firestore = Firestore::with_transport(config, transport.clone());
    (firestore, transport)
}
