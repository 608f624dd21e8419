//! Report data types.
//!
//! This module defines the structures a verification run produces:
//! [`ClaimAnalysis`], [`ClaimType`], [`ClaimStatus`], and the
//! [`VerificationReport`] that wraps them. All types serialise to and from
//! JSON in the shape the model is instructed to emit and the HTTP API
//! re-exposes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What kind of assertion a claim is. Determines which grounding source the
/// model is told to consult.
///
/// Serialises as an uppercase string (e.g. `"CITATION"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimType {
    /// A general factual statement, grounded via web search.
    Fact,
    /// A reference to an academic paper, grounded via the citation index.
    Citation,
    /// A statement about a URL, grounded via the pre-fetched page content.
    Url,
}

impl std::fmt::Display for ClaimType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimType::Fact => write!(f, "FACT"),
            ClaimType::Citation => write!(f, "CITATION"),
            ClaimType::Url => write!(f, "URL"),
        }
    }
}

impl std::str::FromStr for ClaimType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FACT" => Ok(ClaimType::Fact),
            "CITATION" => Ok(ClaimType::Citation),
            "URL" => Ok(ClaimType::Url),
            _ => Err(format!(
                "unknown claim type {:?}; expected one of: FACT, CITATION, URL",
                s
            )),
        }
    }
}

/// The verdict assigned to a claim.
///
/// Serialises as an uppercase snake_case string (e.g. `"BROKEN_URL"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    /// Accurate, and any cited URL content supports it.
    Verified,
    /// False, fabricated, or contradicted by the cited URL.
    Hallucination,
    /// Could not be fully verified; needs human review.
    Suspicious,
    /// Subjective statement; not verified.
    Opinion,
    /// The referenced URL is unreachable or returns an error.
    BrokenUrl,
}

impl ClaimStatus {
    /// `true` for the statuses that call for a correction.
    pub fn is_problem(self) -> bool {
        matches!(self, ClaimStatus::Hallucination | ClaimStatus::BrokenUrl)
    }
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimStatus::Verified => write!(f, "VERIFIED"),
            ClaimStatus::Hallucination => write!(f, "HALLUCINATION"),
            ClaimStatus::Suspicious => write!(f, "SUSPICIOUS"),
            ClaimStatus::Opinion => write!(f, "OPINION"),
            ClaimStatus::BrokenUrl => write!(f, "BROKEN_URL"),
        }
    }
}

impl std::str::FromStr for ClaimStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VERIFIED" => Ok(ClaimStatus::Verified),
            "HALLUCINATION" => Ok(ClaimStatus::Hallucination),
            "SUSPICIOUS" => Ok(ClaimStatus::Suspicious),
            "OPINION" => Ok(ClaimStatus::Opinion),
            "BROKEN_URL" => Ok(ClaimStatus::BrokenUrl),
            _ => Err(format!(
                "unknown claim status {:?}; expected one of: \
                 VERIFIED, HALLUCINATION, SUSPICIOUS, OPINION, BROKEN_URL",
                s
            )),
        }
    }
}

fn default_confidence() -> u8 {
    50
}

/// One assessed sentence or claim from the input text.
///
/// # Wire format
///
/// ```json
/// {
///   "original_text": "The Transformer was introduced by Vaswani et al. in 2017.",
///   "type": "CITATION",
///   "status": "VERIFIED",
///   "reasoning": "Found 'Attention Is All You Need' (2017).",
///   "correction": null,
///   "source_url": "https://arxiv.org/abs/1706.03762",
///   "confidence_score": 97
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimAnalysis {
    /// The exact substring of the input this claim covers.
    pub original_text: String,

    #[serde(rename = "type")]
    pub claim_type: ClaimType,

    pub status: ClaimStatus,

    /// Why the status was assigned.
    pub reasoning: String,

    /// Corrected statement for non-verified claims.
    #[serde(default)]
    pub correction: Option<String>,

    /// URL supporting the verdict or the correction.
    #[serde(default)]
    pub source_url: Option<String>,

    /// 0–100. Defaults to 50 when the model omits it.
    #[serde(default = "default_confidence")]
    pub confidence_score: u8,
}

/// The ordered set of claims assessed for one input text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationReport {
    pub claims: Vec<ClaimAnalysis>,
}

impl VerificationReport {
    /// A report with zero claims; what a failed run collapses to.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Number of claims per status. Statuses with no claims are omitted.
    pub fn status_counts(&self) -> BTreeMap<ClaimStatus, usize> {
        let mut counts = BTreeMap::new();
        for claim in &self.claims {
            *counts.entry(claim.status).or_insert(0) += 1;
        }
        counts
    }
}
