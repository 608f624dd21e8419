//! HTTP request handlers.
//!
//! Handlers are async functions that receive Axum extractors and return
//! `Result<impl IntoResponse, AppError>`. Request bodies are taken as
//! `Result<Json<T>, JsonRejection>` so malformed JSON gets the standard
//! error body.

pub mod citation;
pub mod health;
pub mod verify;

use std::sync::Arc;

use vibecheck::Verifier;

/// Shared application state threaded through all Axum handlers via [`axum::extract::State`].
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<Verifier>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{body::Body, http::Request, response::Response, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use vibecheck::{
        ConfigError, ContentFetcher, GenerativeModel, ModelError, ModelProvider, ScholarClient,
        Toolbox, UrlValidator, Verifier,
    };

    use crate::{config::ServerConfig, router::build_router};

    pub const REPORT: &str = r#"{"claims": [{
        "original_text": "The Transformer was introduced by Vaswani et al. in 2017.",
        "type": "CITATION",
        "status": "VERIFIED",
        "reasoning": "Found 'Attention Is All You Need' (2017).",
        "correction": null,
        "source_url": "https://arxiv.org/abs/1706.03762",
        "confidence_score": 97
    }]}"#;

    /// Answers every prompt with [`REPORT`]; only accepts the key `"good"`.
    pub struct FakeProvider {
        pub keys_seen: Mutex<Vec<Option<String>>>,
    }

    struct FakeModel;

    #[async_trait]
    impl GenerativeModel for FakeModel {
        async fn generate(&self, _prompt: &str, _tools: &Toolbox) -> Result<String, ModelError> {
            Ok(format!("```json\n{REPORT}\n```"))
        }
    }

    impl ModelProvider for FakeProvider {
        fn model_id(&self) -> &str {
            "fake-model"
        }

        fn model_for(
            &self,
            api_key: Option<&str>,
        ) -> Result<Arc<dyn GenerativeModel>, ConfigError> {
            self.keys_seen.lock().unwrap().push(api_key.map(str::to_string));
            match api_key {
                Some("good") => Ok(Arc::new(FakeModel)),
                _ => Err(ConfigError::MissingCredential),
            }
        }
    }

    pub fn build_app_with(scholar_base: &str) -> (Router, Arc<FakeProvider>) {
        let provider = Arc::new(FakeProvider {
            keys_seen: Mutex::new(Vec::new()),
        });
        let verifier = Verifier::new(
            UrlValidator::new().unwrap(),
            ContentFetcher::new().unwrap(),
            ScholarClient::new(scholar_base).unwrap(),
            provider.clone(),
        );
        let router = build_router(Arc::new(verifier), &ServerConfig::default());
        (router, provider)
    }

    pub fn build_app() -> (Router, Arc<FakeProvider>) {
        build_app_with("http://127.0.0.1:9")
    }

    pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn send(app: Router, req: Request<Body>) -> (Response<()>, serde_json::Value) {
        let resp = app.oneshot(req).await.unwrap();
        let (parts, body) = resp.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (Response::from_parts(parts, ()), json)
    }
}
