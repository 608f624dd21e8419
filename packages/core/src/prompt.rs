//! Instruction payload for the verification model.

use std::fmt::Write as _;

use crate::content::{excerpt, UrlContent};
use crate::urls::UrlValidation;

/// Per-URL cap on page text embedded in the prompt, independent of the fetch
/// budget.
pub const PROMPT_EXCERPT_CHARS: usize = 2000;

/// One line per URL: accessibility, status code, error. Empty when there are
/// no URLs.
pub fn render_validation_context(validations: &[UrlValidation]) -> String {
    if validations.is_empty() {
        return String::new();
    }

    let mut out = String::from("URL VALIDATION RESULTS (pre-checked):\n");
    for v in validations {
        let state = if v.is_accessible {
            "ACCESSIBLE"
        } else {
            "BROKEN/INACCESSIBLE"
        };
        let _ = write!(out, "- {}: {state}", v.url);
        if let Some(code) = v.status_code {
            let _ = write!(out, " (HTTP {code})");
        }
        if let Some(err) = &v.error {
            let _ = write!(out, " - {err}");
        }
        out.push('\n');
    }
    out
}

/// Title and capped excerpt per fetched URL, or the reason it could not be
/// fetched. Empty when there are no URLs.
pub fn render_content_context(contents: &[UrlContent]) -> String {
    if contents.is_empty() {
        return String::new();
    }

    let mut out = String::from("URL CONTENT EXTRACTED (for verification against claims):\n");
    for c in contents {
        match c.content.as_deref().filter(|_| c.success) {
            Some(text) if !text.is_empty() => {
                let _ = write!(out, "\n--- URL: {}", c.url);
                if let Some(title) = &c.title {
                    let _ = write!(out, " - Title: {title}");
                }
                let _ = writeln!(out, " ---\n{}", excerpt(text, PROMPT_EXCERPT_CHARS));
            }
            _ => {
                let reason = c.error.as_deref().unwrap_or("Unknown error");
                let _ = writeln!(
                    out,
                    "\n--- URL: {} ---\nCould not fetch content: {reason}",
                    c.url
                );
            }
        }
    }
    out
}

const PREAMBLE: &str = "\
You are VibeCheck, a fact-verification engine that detects hallucinations in \
AI-generated text.

MISSION: Analyze the text below for factual accuracy, fabricated citations, \
broken URLs, and mismatches between what the text says about a URL and what \
the URL actually contains.

PROCEDURE:
1. Break the text into distinct claims or sentences.
2. Classify each claim by type:
   - FACT: general knowledge, news, history, science, current events.
   - CITATION: a reference to a paper, study, or research result.
   - URL: a claim that points at a web address.
3. For FACT claims, use Google Search to verify them.
4. For CITATION claims, call the 'verify_paper_tool' function with the title \
and/or author. NOT FOUND means the citation is likely fabricated.
5. For URL claims, consult the URL VALIDATION RESULTS and the URL CONTENT \
EXTRACTED sections below. Compare the page content with what the text claims \
about it. If the content does not support the claim, it is a HALLUCINATION.

LABELS:
- VERIFIED: the claim is accurate and any cited URL content supports it.
- HALLUCINATION: the claim is false, the citation does not exist, or the URL \
content contradicts or does not support the claim.
- SUSPICIOUS: the claim cannot be fully verified and needs review.
- OPINION: a subjective statement; no verification needed.
- BROKEN_URL: the URL is not accessible or returns an error.

CORRECTION RULES:
- Every claim that is not VERIFIED or OPINION needs a correction.
- NEVER leave 'correction' null for HALLUCINATION.
  a) Text wrong, URL right: correct the text to match what the URL says and \
keep the URL in source_url.
  b) URL wrong, text plausible: search for a URL that supports the claim and \
put it in both the correction and source_url.
  c) Both wrong: search for what is actually true and give the corrected \
text with its source URL.
  d) Fabricated citation: use \"[CITATION REMOVED: Reference could not be verified]\".
- For BROKEN_URL, search for a working alternative with similar content and \
include it in the correction if one exists.
- Always put the correct, verified URL in source_url.
- Rate confidence from 0 to 100 based on source reliability.
";

const OUTPUT_FORMAT: &str = r#"OUTPUT FORMAT:
Return one JSON object with this structure:
{
  "claims": [
    {
      "original_text": "The exact sentence from the input",
      "type": "FACT" | "CITATION" | "URL",
      "status": "VERIFIED" | "HALLUCINATION" | "SUSPICIOUS" | "OPINION" | "BROKEN_URL",
      "reasoning": "Why this status was assigned, including what the URL actually contains if relevant",
      "correction": "The corrected statement, or null if VERIFIED",
      "source_url": "The URL that supports the verified or corrected information",
      "confidence_score": 0-100
    }
  ]
}

EXAMPLE:
Input "According to https://example.com, Python was created in 2020" where the page says Python was created in 1991:
{
  "original_text": "According to https://example.com, Python was created in 2020",
  "type": "URL",
  "status": "HALLUCINATION",
  "reasoning": "The page at https://example.com states Python was created in 1991 by Guido van Rossum, not in 2020.",
  "correction": "According to https://example.com, Python was created in 1991 by Guido van Rossum.",
  "source_url": "https://example.com",
  "confidence_score": 95
}
"#;

/// Assemble the full instruction payload. `text` is appended verbatim.
pub fn build_prompt(text: &str, validation_context: &str, content_context: &str) -> String {
    let mut prompt = String::with_capacity(PREAMBLE.len() + OUTPUT_FORMAT.len() + text.len());
    prompt.push_str(PREAMBLE);
    for block in [validation_context, content_context] {
        if !block.is_empty() {
            prompt.push('\n');
            prompt.push_str(block);
        }
    }
    prompt.push('\n');
    prompt.push_str(OUTPUT_FORMAT);
    prompt.push_str("\nTEXT TO ANALYZE:\n");
    prompt.push_str(text);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(url: &str, accessible: bool, code: Option<u16>, error: Option<&str>) -> UrlValidation {
        UrlValidation {
            url: url.into(),
            is_valid: true,
            is_accessible: accessible,
            status_code: code,
            error: error.map(Into::into),
            redirect_url: None,
        }
    }

    #[test]
    fn no_urls_means_empty_blocks() {
        assert_eq!(render_validation_context(&[]), "");
        assert_eq!(render_content_context(&[]), "");
    }

    #[test]
    fn validation_lines() {
        let block = render_validation_context(&[
            validation("https://a.example", true, Some(200), None),
            validation("https://b.example", false, None, Some("Request timed out")),
        ]);
        assert!(block.contains("- https://a.example: ACCESSIBLE (HTTP 200)\n"));
        assert!(block.contains("- https://b.example: BROKEN/INACCESSIBLE - Request timed out\n"));
    }

    #[test]
    fn content_excerpt_is_capped() {
        let long = "x".repeat(4000);
        let block = render_content_context(&[UrlContent {
            url: "https://a.example".into(),
            success: true,
            title: Some("A Page".into()),
            content: Some(long),
            error: None,
        }]);
        assert!(block.contains("--- URL: https://a.example - Title: A Page ---"));
        let expected = format!("{}...", "x".repeat(PROMPT_EXCERPT_CHARS));
        assert!(block.contains(&expected));
        assert!(!block.contains(&"x".repeat(PROMPT_EXCERPT_CHARS + 1)));
    }

    #[test]
    fn failed_fetch_is_noted() {
        let block = render_content_context(&[UrlContent {
            url: "https://gone.example".into(),
            success: false,
            title: None,
            content: None,
            error: Some("HTTP 404".into()),
        }]);
        assert!(block.contains("--- URL: https://gone.example ---\nCould not fetch content: HTTP 404"));
    }

    #[test]
    fn prompt_carries_rules_and_text() {
        let text = "The moon is made of cheese.\nSee https://x.example";
        let prompt = build_prompt(text, "URL VALIDATION RESULTS (pre-checked):\n", "");
        assert!(prompt.contains("verify_paper_tool"));
        assert!(prompt.contains("NEVER leave 'correction' null for HALLUCINATION"));
        assert!(prompt.contains("[CITATION REMOVED: Reference could not be verified]"));
        assert!(prompt.contains("BROKEN_URL"));
        assert!(prompt.contains("\"confidence_score\": 95"));
        assert!(prompt.contains("URL VALIDATION RESULTS"));
        assert!(!prompt.contains("URL CONTENT EXTRACTED (for"));
        assert!(prompt.ends_with(text));
    }
}
