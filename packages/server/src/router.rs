//! Assembles the Axum [`Router`] from all handler modules.

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use vibecheck::Verifier;

use crate::{
    config::ServerConfig,
    handlers::{citation, health, verify, AppState},
};

/// Build the complete application router with shared state.
pub fn build_router(verifier: Arc<Verifier>, config: &ServerConfig) -> Router {
    let state = AppState { verifier };

    Router::new()
        .route("/", get(health::health))
        .route("/health", get(health::health))
        .route("/api/verify", post(verify::verify))
        .route("/api/check-citation", post(citation::check_citation))
        .route("/api/batch-verify", post(verify::batch_verify))
        .with_state(state)
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::{Request, StatusCode}};

    use crate::handlers::test_support::{build_app, send};

    #[tokio::test]
    async fn cors_headers_are_sent() {
        let (app, _) = build_app();
        let req = Request::builder()
            .uri("/health")
            .header("origin", "https://frontend.example")
            .body(Body::empty())
            .unwrap();
        let (resp, _) = send(app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (app, _) = build_app();
        let req = Request::builder().uri("/api/nope").body(Body::empty()).unwrap();
        let (resp, _) = send(app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
