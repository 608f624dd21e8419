//! Page content extraction.
//!
//! [`ContentFetcher`] downloads a URL and reduces it to a plain-text excerpt
//! bounded by a character budget, so the model can compare what a text says
//! about a page against what the page actually contains.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{header, redirect, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::urls::{extract_urls, MAX_REDIRECTS};

/// Timeout for a content download.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Default character budget for extracted content.
pub const DEFAULT_MAX_CHARS: usize = 5000;

/// Appended when HTML text is cut to the budget.
pub const ELLIPSIS: &str = "...";

const FETCH_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const FETCH_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const FETCH_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Blocks removed together with their content before tags are stripped.
static NOISE_BLOCK_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "nav", "footer", "header"]
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}[^>]*>.*?</{tag}>")).expect("invalid block regex")
        })
        .collect()
});

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("invalid title regex"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("invalid tag regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// Outcome of fetching one URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlContent {
    pub url: String,

    /// Usable content was obtained.
    pub success: bool,

    #[serde(default)]
    pub title: Option<String>,

    /// Extracted text, bounded by the fetch budget.
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

impl UrlContent {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            success: false,
            title: None,
            content: None,
            error: None,
        }
    }

    fn fail(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Downloads pages and extracts bounded plain-text excerpts.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
    max_chars: usize,
}

impl ContentFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(FETCH_ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static(FETCH_ACCEPT_LANGUAGE),
        );
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(FETCH_USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            max_chars: DEFAULT_MAX_CHARS,
        })
    }

    /// Override the character budget used by [`fetch`](Self::fetch).
    pub fn max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Fetch `url` with the configured budget.
    pub async fn fetch(&self, url: &str) -> UrlContent {
        self.fetch_with_budget(url, self.max_chars).await
    }

    /// Fetch `url` and extract at most `max_chars` characters of text.
    /// Never fails; see [`UrlContent`] for the outcome.
    pub async fn fetch_with_budget(&self, url: &str, max_chars: usize) -> UrlContent {
        let result = UrlContent::new(url);

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return result.fail(describe_fetch_error(&e)),
        };

        let status = response.status().as_u16();
        if status >= 400 {
            return result.fail(format!("HTTP {status}"));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => return result.fail(describe_fetch_error(&e)),
        };

        let extracted = extract(&content_type, &body, max_chars);
        debug!(url, status, %content_type, ok = extracted.is_ok(), "url fetched");

        match extracted {
            Ok((title, content)) => UrlContent {
                success: true,
                title,
                content: Some(content),
                ..result
            },
            Err(e) => result.fail(e),
        }
    }

    /// Fetch every URL found in `text`, one at a time.
    pub async fn fetch_all(&self, text: &str) -> Vec<UrlContent> {
        let mut results = Vec::new();
        for url in extract_urls(text) {
            results.push(self.fetch(&url).await);
        }
        results
    }
}

/// Branch on the declared content type. Returns `(title, content)`.
fn extract(
    content_type: &str,
    body: &str,
    max_chars: usize,
) -> Result<(Option<String>, String), String> {
    if content_type.contains("text/html") || content_type.contains("application/xhtml") {
        let (title, text) = html_to_text(body);
        Ok((title, truncate_with_ellipsis(&text, max_chars)))
    } else if content_type.contains("application/json") {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| format!("Invalid JSON body: {e}"))?;
        Ok((None, truncate_chars(&value.to_string(), max_chars).to_string()))
    } else if content_type.contains("text/plain") {
        Ok((None, truncate_chars(body, max_chars).to_string()))
    } else {
        Err(format!("Unsupported content type: {content_type}"))
    }
}

/// Strip an HTML document to whitespace-normalised text.
///
/// Script, style, nav, footer and header blocks go first (content included).
/// The title is read from what remains, then every tag becomes a space.
pub fn html_to_text(html: &str) -> (Option<String>, String) {
    let mut cleaned = html.to_string();
    for re in NOISE_BLOCK_RES.iter() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }

    let title = TITLE_RE
        .captures(&cleaned)
        .and_then(|c| c.get(1))
        .map(|m| html_escape::decode_html_entities(m.as_str().trim()).into_owned())
        .filter(|t| !t.is_empty());

    let text = TAG_RE.replace_all(&cleaned, " ");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    let text = html_escape::decode_html_entities(text.trim()).into_owned();

    (title, text)
}

/// The first `max_chars` characters of `s`.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Like [`truncate_chars`] but marks the cut with [`ELLIPSIS`].
fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    let cut = truncate_chars(s, max_chars);
    if cut.len() < s.len() {
        format!("{cut}{ELLIPSIS}")
    } else {
        s.to_string()
    }
}

/// Cap `s` at `max_chars` characters, appending [`ELLIPSIS`] when cut.
/// Used for the per-URL excerpts embedded in the model prompt.
pub(crate) fn excerpt(s: &str, max_chars: usize) -> String {
    truncate_with_ellipsis(s, max_chars)
}

fn describe_fetch_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timed out".into()
    } else if e.is_connect() {
        "Connection failed".into()
    } else {
        e.to_string()
    }
}
