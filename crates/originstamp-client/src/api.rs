//! Timestamping service abstraction and wire types.
//!
//! The service is consumed as an opaque HTTP JSON API. Implementations may
//! talk to the real service ([`crate::HttpTimestampApi`]) or record calls in
//! memory for tests ([`memory::MemoryTimestampApi`]).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use originstamp_core::RemoteSubmissionEntry;

use crate::error::Result;

/// Body of `POST /api/<digest>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub hash_string: String,
    /// Notification address; empty when none is configured.
    #[serde(default)]
    pub email: String,
}

/// Body of `POST /api/table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRequest {
    pub api_key: String,
    pub offset: u64,
    pub records: u64,
}

/// Response of `POST /api/table`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableResponse {
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub hashes: Vec<RemoteSubmissionEntry>,
}

/// Acknowledgement of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAck {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

/// The outbound seam to the timestamping service.
#[async_trait]
pub trait TimestampApi: Send + Sync {
    /// Submit a digest for timestamping.
    async fn submit(&self, api_key: &str, request: &SubmitRequest) -> Result<RemoteAck>;

    /// Fetch one page of the submission history for `api_key`.
    async fn table(&self, api_key: &str, request: &TableRequest) -> Result<TableResponse>;
}

/// An in-memory timestamping service for tests.
///
/// Records every call and serves a fixed submission history.
pub mod memory {
    use super::*;
    use crate::error::ClientError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        submissions: Vec<(String, SubmitRequest)>,
        table_calls: Vec<TableRequest>,
        history: Vec<RemoteSubmissionEntry>,
        failure: Option<String>,
    }

    /// Recording fake of the timestamping service.
    #[derive(Default)]
    pub struct MemoryTimestampApi {
        state: Mutex<State>,
    }

    impl MemoryTimestampApi {
        pub fn new() -> Self {
            Self::default()
        }

        /// Serve `history` from `table` calls.
        pub fn with_history(history: Vec<RemoteSubmissionEntry>) -> Self {
            let api = Self::new();
            api.lock().history = history;
            api
        }

        /// Make every subsequent `submit` fail with `message`.
        pub fn fail_submissions(&self, message: impl Into<String>) {
            self.lock().failure = Some(message.into());
        }

        /// Every `(api_key, request)` passed to `submit`.
        pub fn submissions(&self) -> Vec<(String, SubmitRequest)> {
            self.lock().submissions.clone()
        }

        /// Every request passed to `table`.
        pub fn table_calls(&self) -> Vec<TableRequest> {
            self.lock().table_calls.clone()
        }

        /// Total outbound calls of either kind.
        pub fn call_count(&self) -> usize {
            let state = self.lock();
            state.submissions.len() + state.table_calls.len()
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, State> {
            self.state.lock().unwrap_or_else(|e| e.into_inner())
        }
    }

    #[async_trait]
    impl TimestampApi for MemoryTimestampApi {
        async fn submit(&self, api_key: &str, request: &SubmitRequest) -> Result<RemoteAck> {
            let mut state = self.lock();
            state
                .submissions
                .push((api_key.to_string(), request.clone()));

            if let Some(message) = &state.failure {
                return Err(ClientError::Remote(message.clone()));
            }
            Ok(RemoteAck {
                status: 200,
                body: format!("{{\"hash_string\":\"{}\"}}", request.hash_string),
            })
        }

        async fn table(&self, _api_key: &str, request: &TableRequest) -> Result<TableResponse> {
            let mut state = self.lock();
            state.table_calls.push(request.clone());

            let total = state.history.len();
            let start = (request.offset as usize).min(total);
            let end = start.saturating_add(request.records as usize).min(total);
            Ok(TableResponse {
                total_records: total as u64,
                hashes: state.history[start..end].to_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryTimestampApi;
    use super::*;
    use originstamp_core::SubmitStatus;

    fn entry(i: i64) -> RemoteSubmissionEntry {
        RemoteSubmissionEntry {
            hash_string: format!("{:064x}", i),
            date_created: i * 1000,
            submit_status: SubmitStatus { multi_seed: 0 },
            email: None,
        }
    }

    #[test]
    fn test_wire_shapes() {
        let submit = serde_json::to_value(SubmitRequest {
            hash_string: "ab".into(),
            email: String::new(),
        })
        .unwrap();
        assert_eq!(
            submit,
            serde_json::json!({"hash_string": "ab", "email": ""})
        );

        let table = serde_json::to_value(TableRequest {
            api_key: "k".into(),
            offset: 50,
            records: 25,
        })
        .unwrap();
        assert_eq!(
            table,
            serde_json::json!({"api_key": "k", "offset": 50, "records": 25})
        );

        let response: TableResponse = serde_json::from_str(r#"{"total_records": 2}"#).unwrap();
        assert_eq!(response.total_records, 2);
        assert!(response.hashes.is_empty());
    }

    #[tokio::test]
    async fn test_memory_api_pages_history() {
        let api = MemoryTimestampApi::with_history((0..57).map(entry).collect());
        let request = TableRequest {
            api_key: "k".into(),
            offset: 50,
            records: 25,
        };
        let page = api.table("k", &request).await.unwrap();
        assert_eq!(page.total_records, 57);
        assert_eq!(page.hashes.len(), 7);
        assert_eq!(page.hashes[0], entry(50));

        let past_end = TableRequest {
            offset: 100,
            ..request
        };
        assert!(api.table("k", &past_end).await.unwrap().hashes.is_empty());
        assert_eq!(api.table_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_memory_api_failure_still_records_call() {
        let api = MemoryTimestampApi::new();
        api.fail_submissions("connection refused");
        let request = SubmitRequest {
            hash_string: "ab".into(),
            email: String::new(),
        };
        assert!(api.submit("k", &request).await.is_err());
        assert_eq!(api.submissions().len(), 1);
        assert_eq!(api.call_count(), 1);
    }
}
