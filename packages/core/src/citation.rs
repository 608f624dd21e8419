//! Academic citation lookup against the Semantic Scholar paper index.
//!
//! One lookup routine, [`ScholarClient::lookup`], backs two entry points:
//!
//! - [`ScholarClient::verify_paper_tool`] renders the outcome as a sentence
//!   for the model's function-calling loop.
//! - [`ScholarClient::verify_paper`] returns a structured [`CitationRecord`]
//!   for direct programmatic use and the HTTP API.
//!
//! A miss is meaningful: the caller treats a paper the index has never heard
//! of as evidence the citation was fabricated.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Timeout for one index search.
pub const SCHOLAR_TIMEOUT: Duration = Duration::from_secs(5);

/// Public Semantic Scholar API base.
pub const DEFAULT_SCHOLAR_BASE: &str = "https://api.semanticscholar.org";

const SEARCH_FIELDS: &str = "title,authors,year,url,abstract,citationCount";

/// How many authors are reported for a match.
const TOP_AUTHORS: usize = 3;

/// Errors from a single search request.
#[derive(Debug, thiserror::Error)]
pub enum ScholarError {
    #[error("Semantic Scholar request timed out")]
    Timeout,

    #[error("Semantic Scholar unreachable: {0}")]
    Http(reqwest::Error),

    #[error("Semantic Scholar returned status {0}")]
    BadStatus(u16),
}

impl From<reqwest::Error> for ScholarError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScholarError::Timeout
        } else {
            ScholarError::Http(e)
        }
    }
}

/// A paper as returned by the search endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    /// Occasionally null in the index.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<PaperAuthor>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub citation_count: Option<u64>,
}

impl Paper {
    pub fn author_names(&self) -> Vec<String> {
        self.authors.iter().filter_map(|a| a.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PaperAuthor {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Paper>,
}

/// Result of one lookup, before it is rendered for either entry point.
#[derive(Debug)]
pub enum CitationLookup {
    Found(Paper),
    /// The index holds nothing matching the normalised query.
    NotFound { query: String },
    /// The index could not be asked.
    Unavailable(ScholarError),
}

/// Structured outcome of a citation check.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CitationRecord {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// At most three names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    /// Whether the supplied author last name appears among the match's
    /// authors. Absent when no author was supplied. Does not affect `found`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_match: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CitationRecord {
    pub fn not_found(error: impl Into<String>) -> Self {
        Self {
            found: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Strip the tokens that make free-text citations match badly.
pub fn normalize_query(query: &str) -> String {
    query
        .replace("et al.", "")
        .replace(['(', ')'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Client for the paper search endpoint.
#[derive(Debug, Clone)]
pub struct ScholarClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ScholarClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, SCHOLAR_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: None,
        })
    }

    /// Send `x-api-key` with every search (raises the public rate limit).
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Ask the index for the single best match for `query`.
    pub async fn search(&self, query: &str) -> Result<Option<Paper>, ScholarError> {
        let url = format!("{}/graph/v1/paper/search", self.base_url.trim_end_matches('/'));
        let mut req = self
            .client
            .get(&url)
            .query(&[("query", query), ("fields", SEARCH_FIELDS), ("limit", "1")]);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScholarError::BadStatus(status.as_u16()));
        }
        let page: SearchResponse = response.json().await?;
        Ok(page.data.into_iter().next())
    }

    /// Normalise `query` and look it up. Shared by both entry points.
    pub async fn lookup(&self, query: &str) -> CitationLookup {
        let query = normalize_query(query);
        let outcome = match self.search(&query).await {
            Ok(Some(paper)) => CitationLookup::Found(paper),
            Ok(None) => CitationLookup::NotFound { query },
            Err(e) => CitationLookup::Unavailable(e),
        };
        debug!(found = matches!(outcome, CitationLookup::Found(_)), "citation lookup");
        outcome
    }

    /// Model-facing entry point: a sentence describing the outcome.
    pub async fn verify_paper_tool(&self, query: &str) -> String {
        describe_lookup(&self.lookup(query).await)
    }

    /// Structured entry point. When `author_last_name` is given it is
    /// prepended to the query and checked against the match's authors.
    pub async fn verify_paper(&self, title: &str, author_last_name: Option<&str>) -> CitationRecord {
        let author = author_last_name.map(str::trim).filter(|a| !a.is_empty());
        let query = match author {
            Some(a) => format!("{a} {title}"),
            None => title.to_string(),
        };
        record_from_lookup(self.lookup(&query).await, author)
    }
}

/// Render a lookup as the sentence handed back to the model.
pub fn describe_lookup(lookup: &CitationLookup) -> String {
    match lookup {
        CitationLookup::Found(paper) => {
            let authors = paper
                .author_names()
                .into_iter()
                .take(TOP_AUTHORS)
                .collect::<Vec<_>>()
                .join(", ");
            let year = paper.year.map(|y| y.to_string()).unwrap_or_else(|| "N/A".into());
            format!(
                "FOUND: '{}' ({year}) by {authors}. Citations: {}. URL: {}",
                paper.title.as_deref().unwrap_or("N/A"),
                paper.citation_count.unwrap_or(0),
                paper.url.as_deref().unwrap_or("N/A"),
            )
        }
        CitationLookup::NotFound { query } => format!(
            "NOT FOUND: No matching paper found for '{query}' in the academic database. \
             This citation is likely hallucinated."
        ),
        CitationLookup::Unavailable(ScholarError::Timeout) => {
            "API Timeout: Semantic Scholar took too long to respond.".into()
        }
        CitationLookup::Unavailable(_) => "API Error: Semantic Scholar unreachable.".into(),
    }
}

fn record_from_lookup(lookup: CitationLookup, author: Option<&str>) -> CitationRecord {
    match lookup {
        CitationLookup::Found(paper) => {
            let names = paper.author_names();
            let author_match = author.map(|a| {
                let needle = a.to_lowercase();
                names.iter().any(|n| n.to_lowercase().contains(&needle))
            });
            CitationRecord {
                found: true,
                title: paper.title,
                year: paper.year,
                url: paper.url,
                authors: Some(names.into_iter().take(TOP_AUTHORS).collect()),
                author_match,
                citation_count: Some(paper.citation_count.unwrap_or(0)),
                error: None,
            }
        }
        CitationLookup::NotFound { .. } => CitationRecord::not_found("Paper not found"),
        CitationLookup::Unavailable(ScholarError::Timeout) => CitationRecord::not_found("API timeout"),
        CitationLookup::Unavailable(_) => CitationRecord::not_found("API unreachable"),
    }
}
