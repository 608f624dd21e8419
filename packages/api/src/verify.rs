//! Verification request and response types.

use serde::{Deserialize, Serialize};

use vibecheck::VerificationReport;

/// Most texts accepted by one `POST /api/batch-verify`.
pub const MAX_BATCH_SIZE: usize = 5;

/// Request body for `POST /api/verify`, and one item of a batch.
///
/// `text` must be non-empty. `api_key`, when present, is used for the model
/// call instead of the server's configured credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyRequest {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl VerifyRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            api_key: None,
        }
    }
}

/// Request body for `POST /api/batch-verify`: a bare JSON array of at most
/// [`MAX_BATCH_SIZE`] verify requests.
pub type BatchVerifyRequest = Vec<VerifyRequest>;

/// Outcome of one batch item. Exactly one of `report` and `error` is present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchItemResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<VerificationReport>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItemResult {
    pub fn ok(report: VerificationReport) -> Self {
        Self {
            success: true,
            report: Some(report),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            report: None,
            error: Some(error.into()),
        }
    }
}

/// Response body for `POST /api/batch-verify`, one entry per input in input
/// order.
///
/// ```json
/// { "results": [ { "success": true, "report": { "claims": [] } },
///                { "success": false, "error": "..." } ] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchVerifyResponse {
    pub results: Vec<BatchItemResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_request_is_a_bare_array() {
        let batch: BatchVerifyRequest = serde_json::from_value(json!([
            { "text": "one" },
            { "text": "two", "api_key": "k" }
        ]))
        .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].api_key.as_deref(), Some("k"));
    }

    #[test]
    fn item_results_omit_absent_side() {
        let ok = serde_json::to_value(BatchItemResult::ok(VerificationReport::empty())).unwrap();
        assert_eq!(ok, json!({ "success": true, "report": { "claims": [] } }));

        let failed = serde_json::to_value(BatchItemResult::failed("no credential")).unwrap();
        assert_eq!(failed, json!({ "success": false, "error": "no credential" }));
    }
}
