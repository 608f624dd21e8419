//! Verification handlers: `POST /api/verify` and `POST /api/batch-verify`.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::info;
use vibecheck::VerificationReport;
use vibecheck_api::{
    BatchItemResult, BatchVerifyRequest, BatchVerifyResponse, VerifyRequest, MAX_BATCH_SIZE,
};

use crate::error::AppError;

use super::AppState;

const EMPTY_TEXT: &str = "text must not be empty";

/// Verify one text.
///
/// A missing model credential is a 500 with code `missing_credential`.
/// Any later failure inside the pipeline yields a report with no claims.
pub async fn verify(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerificationReport>, AppError> {
    let Json(req) = payload?;
    if req.text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(EMPTY_TEXT.into()));
    }

    let report = state.verifier.verify(&req.text, req.api_key.as_deref()).await?;
    Ok(Json(report))
}

/// Verify up to [`MAX_BATCH_SIZE`] texts, one after another.
///
/// Oversized batches are rejected before any work starts. Each item succeeds
/// or fails on its own and uses its own `api_key`.
pub async fn batch_verify(
    State(state): State<AppState>,
    payload: Result<Json<BatchVerifyRequest>, JsonRejection>,
) -> Result<Json<BatchVerifyResponse>, AppError> {
    let Json(batch) = payload?;
    if batch.len() > MAX_BATCH_SIZE {
        return Err(AppError::BatchTooLarge(format!(
            "Maximum {MAX_BATCH_SIZE} texts per batch request"
        )));
    }

    info!(items = batch.len(), "batch verification started");
    let mut results = Vec::with_capacity(batch.len());
    for req in &batch {
        let result = if req.text.trim().is_empty() {
            BatchItemResult::failed(EMPTY_TEXT)
        } else {
            match state.verifier.verify(&req.text, req.api_key.as_deref()).await {
                Ok(report) => BatchItemResult::ok(report),
                Err(e) => BatchItemResult::failed(e.to_string()),
            }
        };
        results.push(result);
    }

    Ok(Json(BatchVerifyResponse { results }))
}
