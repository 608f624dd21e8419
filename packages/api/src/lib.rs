//! Request and response types for the VibeCheck HTTP API.
//!
//! Shared by `vibecheck-server` and by anything that calls it, so both sides
//! agree on the wire shapes.
//!
//! # Endpoints covered
//!
//! | Method | Path | Type |
//! |--------|------|------|
//! | GET | `/`, `/health` | → [`HealthResponse`] |
//! | POST | `/api/verify` | [`VerifyRequest`] → [`vibecheck::VerificationReport`] |
//! | POST | `/api/check-citation` | [`CitationCheckRequest`] → [`CitationCheckResponse`] |
//! | POST | `/api/batch-verify` | [`BatchVerifyRequest`] → [`BatchVerifyResponse`] |
//!
//! Every error response carries an [`ErrorResponse`] body.

pub mod citation;
pub mod error;
pub mod health;
pub mod verify;

pub use citation::{CitationCheckRequest, CitationCheckResponse};
pub use error::ErrorResponse;
pub use health::HealthResponse;
pub use verify::{BatchItemResult, BatchVerifyRequest, BatchVerifyResponse, VerifyRequest, MAX_BATCH_SIZE};
