//! JSON response envelope shared by every store API call.
//!
//! The logical `status` field is the sole success signal; the HTTP
//! status code alone is never enough to decide an outcome.

use serde::Deserialize;

use crate::document::Document;

/// Logical status signalling success.
pub const STATUS_OK: i32 = 0;

/// Sentinel logical status for a body that did not parse as the envelope.
pub const STATUS_INVALID_RESPONSE: i32 = -1;

/// Response envelope returned by the store API.
///
/// `http_status` is filled in by the transport after the body is parsed;
/// it is never part of the JSON itself.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResult {
    #[serde(skip)]
    pub http_status: u16,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: serde_json::Value,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub results: Vec<Document>,
}

impl ApiResult {
    /// Parses a response body into an envelope.
    ///
    /// A body that is not a well-formed envelope is converted into a
    /// result carrying the raw body as the message and the
    /// invalid-response sentinel status, so malformed responses never
    /// escape the transport as errors.
    pub fn parse(http_status: u16, body: &str) -> ApiResult {
        match serde_json::from_str::<ApiResult>(body) {
            Ok(mut result) => {
                result.http_status = http_status;
                result
            }
            Err(_) => ApiResult::invalid(http_status, body),
        }
    }

    /// Builds the invalid-response sentinel for an unparseable body.
    pub fn invalid(http_status: u16, raw_body: &str) -> ApiResult {
        ApiResult {
            http_status,
            status: STATUS_INVALID_RESPONSE,
            message: raw_body.to_string(),
            errors: serde_json::Value::Null,
            total: 0,
            results: Vec::new(),
        }
    }

    /// True iff the logical status signals success.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// First result document, if any.
    pub fn first_result(&self) -> Option<&Document> {
        self.results.first()
    }
}
