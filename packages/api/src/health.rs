use serde::{Deserialize, Serialize};

/// Response body for `GET /` and `GET /health`.
///
/// ```json
/// { "status": "healthy", "version": "0.1.0", "model": "gemini-2.5-flash" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// The model identifier verification requests run against.
    pub model: String,
}

impl HealthResponse {
    pub fn healthy(version: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            status: "healthy".into(),
            version: version.into(),
            model: model.into(),
        }
    }
}
