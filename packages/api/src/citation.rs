//! Direct citation lookup types.

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/check-citation`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CitationCheckRequest {
    /// Paper title to search for.
    pub title: String,

    /// Author last name. When present it narrows the search and the response
    /// reports whether the best match lists this author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Response body for `POST /api/check-citation`: the core lookup record,
/// serialised as-is. Absent fields are omitted.
///
/// ```json
/// {
///   "found": true,
///   "title": "Attention Is All You Need",
///   "year": 2017,
///   "url": "https://www.semanticscholar.org/paper/204e3073870fae3d05bcbc2f6a8e263d9b72e776",
///   "authors": ["Ashish Vaswani", "Noam Shazeer", "Niki Parmar"],
///   "author_match": true,
///   "citation_count": 120000
/// }
/// ```
pub type CitationCheckResponse = vibecheck::CitationRecord;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_is_optional() {
        let req: CitationCheckRequest =
            serde_json::from_str(r#"{"title": "Attention Is All You Need"}"#).unwrap();
        assert_eq!(req.author, None);
    }
}
