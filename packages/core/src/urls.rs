//! URL extraction and reachability validation.
//!
//! [`extract_urls`] is a pure text scan. [`UrlValidator`] performs the
//! two-step check: structural parse first, then a HEAD probe that falls back
//! to a streaming GET when the server answers HEAD with an error status.
//! Neither step ever returns an error to the caller; every failure is folded
//! into the [`UrlValidation`] record.

use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{redirect, Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Timeout for each reachability probe.
pub const VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// Browser-like identification sent with probes. Some hosts reject unknown agents.
pub const PROBE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// `https?://` host, then any run of common path/query/fragment characters.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:[-\w.]|%[\da-fA-F]{2})+[/\w\-.~:?#\[\]@!$&'()*+,;=%]*")
        .expect("invalid url regex")
});

/// Find every distinct `http(s)://` URL in `text`.
///
/// Duplicates collapse to one entry; the result is sorted so repeated runs
/// over the same text produce the same order. Trailing punctuation such as a
/// sentence-ending period is captured as part of the URL.
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Outcome of validating one URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlValidation {
    pub url: String,

    /// The URL parsed with a non-empty scheme and host.
    pub is_valid: bool,

    /// The final response status was below 400.
    pub is_accessible: bool,

    #[serde(default)]
    pub status_code: Option<u16>,

    #[serde(default)]
    pub error: Option<String>,

    /// Final URL after redirects, when it differs from the requested one.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

impl UrlValidation {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            is_valid: false,
            is_accessible: false,
            status_code: None,
            error: None,
            redirect_url: None,
        }
    }
}

/// Probes URLs for existence.
///
/// Holds one [`reqwest::Client`] configured with the probe timeout, redirect
/// cap and user agent. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    client: Client,
}

impl UrlValidator {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(VALIDATION_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(PROBE_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Validate one URL. Never fails; see [`UrlValidation`] for the outcome.
    pub async fn check(&self, url: &str) -> UrlValidation {
        let mut result = UrlValidation::new(url);

        let parsed = match parse_structurally(url) {
            Some(parsed) => parsed,
            None => {
                result.error = Some("Invalid URL format".into());
                return result;
            }
        };
        result.is_valid = true;

        match self.probe(parsed.clone()).await {
            Ok((status, final_url)) => {
                result.status_code = Some(status);
                result.is_accessible = status < 400;
                if final_url != parsed {
                    result.redirect_url = Some(final_url.to_string());
                }
            }
            Err(e) => {
                result.error = Some(describe_probe_error(&e));
            }
        }

        debug!(
            url,
            accessible = result.is_accessible,
            status = ?result.status_code,
            "url validated"
        );
        result
    }

    /// Validate every URL found in `text`, one at a time.
    pub async fn validate_all(&self, text: &str) -> Vec<UrlValidation> {
        let mut results = Vec::new();
        for url in extract_urls(text) {
            results.push(self.check(&url).await);
        }
        results
    }

    /// HEAD first; on an error status retry once with GET. The GET body is
    /// dropped unread, which closes the connection.
    async fn probe(&self, url: Url) -> Result<(u16, Url), reqwest::Error> {
        let head = self.client.head(url.clone()).send().await?;
        if head.status().as_u16() < 400 {
            return Ok((head.status().as_u16(), head.url().clone()));
        }

        let get = self.client.get(url).send().await?;
        let outcome = (get.status().as_u16(), get.url().clone());
        drop(get);
        Ok(outcome)
    }
}

/// Parse `url` and require a non-empty scheme and host.
fn parse_structurally(url: &str) -> Option<Url> {
    let parsed = Url::parse(url).ok()?;
    let has_host = parsed.host_str().is_some_and(|h| !h.is_empty());
    if parsed.scheme().is_empty() || !has_host {
        return None;
    }
    Some(parsed)
}

fn describe_probe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timed out".into()
    } else if e.is_redirect() {
        "Too many redirects".into()
    } else if e.is_connect() {
        "Connection failed - URL may not exist".into()
    } else {
        e.to_string()
    }
}

/// One-line human summary of a validation, as handed to the model or printed
/// by the CLI.
pub fn describe_validation(v: &UrlValidation) -> String {
    if !v.is_valid {
        let reason = v.error.as_deref().unwrap_or("Invalid URL format");
        return format!("INVALID URL: '{}' - {}", v.url, reason);
    }
    if v.is_accessible {
        let status = v.status_code.map(|s| s.to_string()).unwrap_or_default();
        let redirect = v
            .redirect_url
            .as_deref()
            .map(|r| format!(" (redirects to: {r})"))
            .unwrap_or_default();
        format!("VALID URL: '{}' is accessible (HTTP {status}){redirect}", v.url)
    } else {
        let reason = match (&v.error, v.status_code) {
            (Some(e), _) => e.clone(),
            (None, Some(code)) => format!("HTTP {code}"),
            (None, None) => "unknown error".into(),
        };
        format!("BROKEN URL: '{}' is not accessible - {reason}", v.url)
    }
}
