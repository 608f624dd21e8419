//! Standard error response body.

use serde::{Deserialize, Serialize};

/// The JSON body returned for all error responses.
///
/// ```json
/// { "error": "Maximum 5 texts per batch request", "code": "batch_too_large" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable description of the problem.
    pub error: String,

    /// Machine-readable error code.
    ///
    /// | `code` | HTTP status |
    /// |--------|------------|
    /// | `invalid_json` | 400 |
    /// | `batch_too_large` | 400 |
    /// | `validation_failed` | 422 |
    /// | `missing_credential` | 500 |
    /// | `internal_error` | 500 |
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: error.into(),
        }
    }
}

/// Well-known error codes.
pub mod codes {
    pub const INVALID_JSON: &str = "invalid_json";
    pub const BATCH_TOO_LARGE: &str = "batch_too_large";
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const MISSING_CREDENTIAL: &str = "missing_credential";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_shape() {
        let e = ErrorResponse::new(codes::VALIDATION_FAILED, "text must not be empty");
        assert_eq!(
            serde_json::to_value(&e).unwrap(),
            serde_json::json!({ "error": "text must not be empty", "code": "validation_failed" })
        );
    }
}
