//! The verification pipeline.
//!
//! [`Verifier::verify`] runs the fixed sequence: extract URLs, validate and
//! fetch each one in turn, render both context blocks, build the prompt,
//! invoke the model once with web search and the citation tool, parse the
//! reply. Only a missing credential is an error; every later failure is
//! logged and yields an empty report.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::citation::ScholarClient;
use crate::config::{ConfigError, VerifierConfig};
use crate::content::{ContentFetcher, UrlContent};
use crate::model::{GeminiProvider, ModelError, ModelProvider};
use crate::prompt::{build_prompt, render_content_context, render_validation_context};
use crate::reply::{parse_report, ReportParseError};
use crate::tools::{CitationTool, Toolbox};
use crate::types::VerificationReport;
use crate::urls::{extract_urls, UrlValidation, UrlValidator};

/// Why a run collapsed to an empty report. Logged, never returned.
#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Parse(#[from] ReportParseError),
}

/// Owns the clients for every outbound dependency. Built once at startup and
/// shared across requests.
#[derive(Clone)]
pub struct Verifier {
    validator: UrlValidator,
    fetcher: ContentFetcher,
    scholar: ScholarClient,
    provider: Arc<dyn ModelProvider>,
}

impl Verifier {
    /// Build the production verifier: Gemini for the model, the configured
    /// academic index for citations.
    pub fn from_config(config: &VerifierConfig) -> Result<Self, ConfigError> {
        let http = |e: reqwest::Error| ConfigError::HttpClient(e.to_string());
        let provider = GeminiProvider::new(config.model.clone()).map_err(http)?;
        Ok(Self {
            validator: UrlValidator::new().map_err(http)?,
            fetcher: ContentFetcher::new().map_err(http)?,
            scholar: ScholarClient::new(config.scholar_base.clone())
                .map_err(http)?
                .with_api_key(config.scholar_api_key.clone()),
            provider: Arc::new(provider),
        })
    }

    /// Assemble a verifier from parts.
    pub fn new(
        validator: UrlValidator,
        fetcher: ContentFetcher,
        scholar: ScholarClient,
        provider: Arc<dyn ModelProvider>,
    ) -> Self {
        Self {
            validator,
            fetcher,
            scholar,
            provider,
        }
    }

    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    pub fn scholar(&self) -> &ScholarClient {
        &self.scholar
    }

    pub fn validator(&self) -> &UrlValidator {
        &self.validator
    }

    pub async fn validate_all_urls(&self, text: &str) -> Vec<UrlValidation> {
        self.validator.validate_all(text).await
    }

    pub async fn fetch_all_url_contents(&self, text: &str) -> Vec<UrlContent> {
        self.fetcher.fetch_all(text).await
    }

    /// Verify `text`, using `api_key` for the model if given.
    ///
    /// Fails only when no model credential can be resolved; that check runs
    /// before any network work.
    pub async fn verify(
        &self,
        text: &str,
        api_key: Option<&str>,
    ) -> Result<VerificationReport, ConfigError> {
        let model = self.provider.model_for(api_key)?;

        let urls = extract_urls(text);
        info!(chars = text.chars().count(), urls = urls.len(), "verification started");

        let mut validations = Vec::with_capacity(urls.len());
        let mut contents = Vec::with_capacity(urls.len());
        for url in &urls {
            let validation = self.validator.check(url).await;
            if !validation.is_accessible {
                warn!(url = %url, error = ?validation.error, "url not accessible");
            }
            validations.push(validation);
            contents.push(self.fetcher.fetch(url).await);
        }

        let prompt = build_prompt(
            text,
            &render_validation_context(&validations),
            &render_content_context(&contents),
        );

        let toolbox = Toolbox::new()
            .with_web_search()
            .with_function(Arc::new(CitationTool::new(self.scholar.clone())));

        let run = async {
            let reply = model.generate(&prompt, &toolbox).await?;
            Ok::<_, RunError>(parse_report(&reply)?)
        };

        match run.await {
            Ok(report) => {
                let problems = report.claims.iter().filter(|c| c.status.is_problem()).count();
                info!(claims = report.claims.len(), problems, "verification finished");
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "verification failed, returning empty report");
                Ok(VerificationReport::empty())
            }
        }
    }
}
