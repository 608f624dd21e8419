//! Health handler: `GET /` and `GET /health`.

use axum::{extract::State, Json};
use vibecheck_api::HealthResponse;

use super::AppState;

/// Reports liveness, the crate version, and the model requests run against.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        env!("CARGO_PKG_VERSION"),
        state.verifier.model_id(),
    ))
}
