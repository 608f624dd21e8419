//! Server configuration, populated from environment variables.

use std::net::SocketAddr;

use vibecheck::VerifierConfig;

#[derive(Debug, thiserror::Error)]
pub enum ServerConfigError {
    #[error("{var} must be a valid socket address (e.g. 0.0.0.0:8000), got {value:?}")]
    InvalidBind { var: &'static str, value: String },
}

/// Runtime configuration for the HTTP service.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `VIBECHECK_BIND` | `0.0.0.0:8000` | TCP socket address to listen on |
/// | `HOST`, `PORT` | `0.0.0.0`, `8000` | Used when `VIBECHECK_BIND` is unset |
/// | `VIBECHECK_CORS_ORIGINS` | `*` | Comma-separated allowed origins |
///
/// Model and academic index variables are read by [`VerifierConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,

    /// Allowed CORS origins. A `*` entry allows any origin.
    pub cors_origins: Vec<String>,

    pub verifier: VerifierConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            cors_origins: vec!["*".into()],
            verifier: VerifierConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Result<Self, ServerConfigError> {
        let (var, value) = match std::env::var("VIBECHECK_BIND") {
            Ok(bind) => ("VIBECHECK_BIND", bind),
            Err(_) => {
                let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
                let port = std::env::var("PORT").unwrap_or_else(|_| "8000".into());
                ("HOST/PORT", format!("{host}:{port}"))
            }
        };
        let bind_addr = value
            .trim()
            .parse()
            .map_err(|_| ServerConfigError::InvalidBind { var, value })?;

        let cors_origins = std::env::var("VIBECHECK_CORS_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| vec!["*".into()]);

        Ok(Self {
            bind_addr,
            cors_origins,
            verifier: VerifierConfig::from_env(),
        })
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    if origins.is_empty() {
        vec!["*".into()]
    } else {
        origins
    }
}
