//! Parsing the model's textual reply into a [`VerificationReport`].

use crate::types::VerificationReport;

#[derive(Debug, thiserror::Error)]
pub enum ReportParseError {
    #[error("reply is not a valid report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("claim {index} has confidence_score {value}, expected 0-100")]
    Confidence { index: usize, value: u8 },
}

/// The interior of a ```` ```json ```` fenced block, else of the first bare
/// fenced block, else the whole reply. Always trimmed.
pub fn extract_json_block(reply: &str) -> &str {
    let interior = |opener: &str| {
        let start = reply.find(opener)? + opener.len();
        let rest = &reply[start..];
        Some(match rest.find("```") {
            Some(end) => &rest[..end],
            None => rest,
        })
    };

    interior("```json")
        .or_else(|| interior("```"))
        .unwrap_or(reply)
        .trim()
}

/// Parse a model reply, stripping any code fence first.
pub fn parse_report(reply: &str) -> Result<VerificationReport, ReportParseError> {
    let report: VerificationReport = serde_json::from_str(extract_json_block(reply))?;
    if let Some((index, claim)) = report
        .claims
        .iter()
        .enumerate()
        .find(|(_, c)| c.confidence_score > 100)
    {
        return Err(ReportParseError::Confidence {
            index,
            value: claim.confidence_score,
        });
    }
    Ok(report)
}
