//! Verifier configuration, populated from environment variables, and the
//! credential precedence rules for model calls.

use crate::citation::DEFAULT_SCHOLAR_BASE;

/// Model used when `VIBECHECK_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const DEFAULT_LOCATION: &str = "us-central1";

pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";

/// Placeholder shipped in example env files; treated as "no project".
const PLACEHOLDER_PROJECT: &str = "your-project-id";

/// Errors that make verification impossible before any work starts.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "no model credential available: supply an api_key, set GEMINI_API_KEY or \
         GOOGLE_API_KEY, or set GOOGLE_CLOUD_PROJECT with GOOGLE_CLOUD_ACCESS_TOKEN"
    )]
    MissingCredential,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Settings for the generative model.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `VIBECHECK_MODEL` | `gemini-2.5-flash` | Model identifier, used for calls and reported by health |
/// | `GOOGLE_CLOUD_LOCATION` | `us-central1` | Deployment location for project-scoped calls |
/// | `GOOGLE_CLOUD_PROJECT` | (absent) | Project for the project-scoped credential |
/// | `GOOGLE_CLOUD_ACCESS_TOKEN` | (absent) | Bearer token used with the project credential |
/// | `GEMINI_API_KEY` | (absent) | First environment key variant |
/// | `GOOGLE_API_KEY` | (absent) | Second environment key variant |
/// | `VIBECHECK_GEMINI_BASE` | Google endpoint | Base URL for API-key calls |
/// | `VIBECHECK_VERTEX_BASE` | `https://{location}-aiplatform.googleapis.com` | Base URL for project calls |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub model: String,
    pub location: String,
    pub project: Option<String>,
    pub access_token: Option<String>,
    pub gemini_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub gemini_base: String,
    pub vertex_base: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            location: DEFAULT_LOCATION.into(),
            project: None,
            access_token: None,
            gemini_api_key: None,
            google_api_key: None,
            gemini_base: DEFAULT_GEMINI_BASE.into(),
            vertex_base: None,
        }
    }
}

impl ModelSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model: env_nonempty("VIBECHECK_MODEL").unwrap_or(defaults.model),
            location: env_nonempty("GOOGLE_CLOUD_LOCATION").unwrap_or(defaults.location),
            project: env_nonempty("GOOGLE_CLOUD_PROJECT").filter(|p| p != PLACEHOLDER_PROJECT),
            access_token: env_nonempty("GOOGLE_CLOUD_ACCESS_TOKEN"),
            gemini_api_key: env_nonempty("GEMINI_API_KEY"),
            google_api_key: env_nonempty("GOOGLE_API_KEY"),
            gemini_base: env_nonempty("VIBECHECK_GEMINI_BASE").unwrap_or(defaults.gemini_base),
            vertex_base: env_nonempty("VIBECHECK_VERTEX_BASE"),
        }
    }

    /// Base URL for project-scoped calls in the configured location.
    pub fn vertex_base(&self) -> String {
        self.vertex_base
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", self.location))
    }
}

/// The credential a model call is made with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    ApiKey(String),
    Project {
        project: String,
        location: String,
        access_token: String,
    },
}

/// Pick a credential: the explicit per-request key, then `GEMINI_API_KEY`,
/// then `GOOGLE_API_KEY`, then the project credential.
pub fn resolve_credential(
    explicit: Option<&str>,
    settings: &ModelSettings,
) -> Result<Credential, ConfigError> {
    let explicit = explicit.map(str::trim).filter(|k| !k.is_empty());
    if let Some(key) = explicit
        .map(str::to_string)
        .or_else(|| settings.gemini_api_key.clone())
        .or_else(|| settings.google_api_key.clone())
    {
        return Ok(Credential::ApiKey(key));
    }

    match (&settings.project, &settings.access_token) {
        (Some(project), Some(token)) => Ok(Credential::Project {
            project: project.clone(),
            location: settings.location.clone(),
            access_token: token.clone(),
        }),
        _ => Err(ConfigError::MissingCredential),
    }
}

/// Everything needed to build a verifier.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `SEMANTIC_SCHOLAR_BASE` | `https://api.semanticscholar.org` | Academic index base URL |
/// | `SEMANTIC_SCHOLAR_API_KEY` | (absent) | Optional index API key |
///
/// Model variables are listed on [`ModelSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    pub model: ModelSettings,
    pub scholar_base: String,
    pub scholar_api_key: Option<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            scholar_base: DEFAULT_SCHOLAR_BASE.into(),
            scholar_api_key: None,
        }
    }
}

impl VerifierConfig {
    pub fn from_env() -> Self {
        Self {
            model: ModelSettings::from_env(),
            scholar_base: env_nonempty("SEMANTIC_SCHOLAR_BASE")
                .unwrap_or_else(|| DEFAULT_SCHOLAR_BASE.into()),
            scholar_api_key: env_nonempty("SEMANTIC_SCHOLAR_API_KEY"),
        }
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
