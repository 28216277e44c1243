//! Test doubles shared by the strategy and publisher tests.

use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use relpush_client::{ApiRequest, ClientError};
use relpush_protocol::{ApiResult, Document, STATUS_OK};

use crate::connection::StoreConnection;
use crate::host::{BuildLog, FileFinder};

/// Scripted connection: pops one canned reply per call and records every
/// request for later assertions.
pub(crate) struct MockConnection {
    pub replies: VecDeque<Result<ApiResult, ClientError>>,
    pub requests: Vec<ApiRequest>,
}

impl MockConnection {
    pub fn new(replies: impl IntoIterator<Item = ApiResult>) -> MockConnection {
        MockConnection {
            replies: replies.into_iter().map(Ok).collect(),
            requests: Vec::new(),
        }
    }

    pub fn with_results(replies: Vec<Result<ApiResult, ClientError>>) -> MockConnection {
        MockConnection {
            replies: replies.into_iter().collect(),
            requests: Vec::new(),
        }
    }

    /// Paths of the executed requests, in order.
    pub fn paths(&self) -> Vec<&str> {
        self.requests.iter().map(|r| r.path.as_str()).collect()
    }
}

impl StoreConnection for MockConnection {
    fn execute(
        &mut self,
        req: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResult, ClientError>> + Send + '_>> {
        self.requests.push(req);
        let reply = self
            .replies
            .pop_front()
            .unwrap_or_else(|| Ok(ok_envelope(serde_json::json!([]))));
        Box::pin(std::future::ready(reply))
    }
}

/// Success envelope carrying the given JSON array as results.
pub(crate) fn ok_envelope(results: serde_json::Value) -> ApiResult {
    envelope(STATUS_OK, "", results)
}

/// Failure envelope with a non-zero logical status.
pub(crate) fn fail_envelope(status: i32, message: &str) -> ApiResult {
    envelope(status, message, serde_json::json!([]))
}

fn envelope(status: i32, message: &str, results: serde_json::Value) -> ApiResult {
    let results: Vec<Document> =
        serde_json::from_value(results).expect("results fixture must be an array of objects");
    ApiResult {
        http_status: 200,
        status,
        message: message.to_string(),
        errors: serde_json::Value::Null,
        total: results.len() as i64,
        results,
    }
}

/// Discards build log lines.
pub(crate) struct NullLog;

impl BuildLog for NullLog {
    fn line(&self, _message: &str) {}
}

/// Finder returning a fixed file list regardless of glob.
pub(crate) struct FixedFinder(pub Vec<PathBuf>);

impl FileFinder for FixedFinder {
    fn find(
        &self,
        _base: &std::path::Path,
        _include: &str,
        _exclude: Option<&str>,
    ) -> std::io::Result<Vec<PathBuf>> {
        Ok(self.0.clone())
    }
}
