//! `vibecheck-server`: HTTP front end for the VibeCheck verification pipeline.
//!
//! # Quick start
//!
//! ```sh
//! # Server-side key, default port 8000:
//! GEMINI_API_KEY=... vibecheck-server
//!
//! # No server key; every request must carry its own api_key:
//! VIBECHECK_BIND=127.0.0.1:9000 vibecheck-server
//! ```
//!
//! A `.env` file in the working directory is loaded first.
//!
//! # Environment variables
//!
//! See [`vibecheck_server::ServerConfig::from_env`] and
//! [`vibecheck::ModelSettings`] for the full list.

use std::sync::Arc;

use vibecheck::{resolve_credential, Verifier};
use vibecheck_server::{build_router, ServerConfig};

#[tokio::main]
async fn main() {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vibecheck=info,vibecheck_server=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = ServerConfig::from_env().unwrap_or_else(|e| panic!("invalid configuration: {e}"));

    let verifier = Verifier::from_config(&config.verifier)
        .unwrap_or_else(|e| panic!("failed to build verifier: {e}"));

    tracing::info!(model = verifier.model_id(), "model configured");
    if resolve_credential(None, &config.verifier.model).is_err() {
        tracing::warn!("no server-side model credential; requests must supply api_key");
    }

    let app = build_router(Arc::new(verifier), &config);

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {e}", config.bind_addr));

    axum::serve(listener, app).await.expect("server error");
}
