//! Hallucination checks for free text.
//!
//! This crate finds the factual claims, academic citations and URLs in a
//! block of text and classifies each one as verified, hallucinated,
//! suspicious, opinion, or broken. It is the library behind the
//! `vibecheck` CLI and the `vibecheck-server` HTTP service.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Report model: [`ClaimAnalysis`], [`VerificationReport`], [`ClaimType`], [`ClaimStatus`] |
//! | [`urls`] | URL extraction and existence probing via [`UrlValidator`] |
//! | [`content`] | Page download and text extraction via [`ContentFetcher`] |
//! | [`citation`] | Academic index lookups via [`ScholarClient`] |
//! | [`tools`] | Functions the model may call mid-generation |
//! | [`model`] | Model invocation: [`GenerativeModel`], [`GeminiModel`] |
//! | [`prompt`] | Instruction payload assembly |
//! | [`reply`] | Parsing model replies into reports |
//! | [`pipeline`] | The end-to-end [`Verifier`] |
//! | [`config`] | Environment configuration and credential precedence |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use vibecheck::{Verifier, VerifierConfig};
//!
//! let verifier = Verifier::from_config(&VerifierConfig::from_env())?;
//! let report = verifier
//!     .verify("The Transformer was introduced by Vaswani et al. in 2017.", None)
//!     .await?;
//! for claim in &report.claims {
//!     println!("[{}] {}", claim.status, claim.original_text);
//! }
//! ```

pub mod citation;
pub mod config;
pub mod content;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod reply;
pub mod tools;
pub mod types;
pub mod urls;

pub use citation::{CitationLookup, CitationRecord, Paper, ScholarClient, ScholarError};
pub use config::{resolve_credential, ConfigError, Credential, ModelSettings, VerifierConfig};
pub use content::{ContentFetcher, UrlContent};
pub use model::{GeminiModel, GeminiProvider, GenerativeModel, ModelError, ModelProvider};
pub use pipeline::Verifier;
pub use reply::{parse_report, ReportParseError};
pub use tools::{CitationTool, Tool, Toolbox};
pub use types::{ClaimAnalysis, ClaimStatus, ClaimType, VerificationReport};
pub use urls::{describe_validation, extract_urls, UrlValidation, UrlValidator};
