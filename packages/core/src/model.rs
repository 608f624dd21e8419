//! Generative-model invocation.
//!
//! # Design
//!
//! [`GenerativeModel`] is the seam the orchestrator calls through; the
//! production implementation is [`GeminiModel`], which speaks the
//! `generateContent` REST API. Because the credential can change per request
//! (a caller may supply their own key), models are obtained from a
//! [`ModelProvider`] rather than constructed once at startup.
//!
//! One call to [`GenerativeModel::generate`] is one logical invocation. When
//! the model answers with `functionCall` parts, each call is dispatched
//! through the [`Toolbox`], the results are appended as a `functionResponse`
//! turn, and the conversation is re-sent. At most [`MAX_TOOL_ROUNDS`] such
//! rounds are allowed. If the endpoint rejects web search combined with
//! function declarations, the invocation is retried with web search alone.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{resolve_credential, ConfigError, Credential, ModelSettings};
use crate::tools::{FunctionDeclaration, Toolbox};

/// Upper bound on one `generateContent` round trip. Search-grounded answers
/// are slow.
pub const MODEL_TIMEOUT: Duration = Duration::from_secs(120);

/// Function-call rounds allowed per invocation.
pub const MAX_TOOL_ROUNDS: usize = 5;

/// Characters of an error body kept in [`ModelError::BadStatus`].
const ERROR_BODY_EXCERPT: usize = 500;

/// Errors from a model invocation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("model returned no text")]
    EmptyResponse,

    #[error("model exceeded {0} function-call rounds")]
    ToolRoundsExceeded(usize),
}

/// A model that turns one prompt into one text reply, optionally calling the
/// granted tools along the way.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str, toolbox: &Toolbox) -> Result<String, ModelError>;
}

/// Builds a model for a request's credential.
pub trait ModelProvider: Send + Sync {
    /// The identifier models from this provider run as.
    fn model_id(&self) -> &str;

    /// A model using `api_key` if given, else the configured fallbacks.
    fn model_for(&self, api_key: Option<&str>) -> Result<Arc<dyn GenerativeModel>, ConfigError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".into()),
            parts,
        }
    }
}

/// One part of a turn. Exactly one payload field is normally set; thought
/// signatures ride along and must be echoed back unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought_signature: Option<String>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ToolSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    google_search: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_declarations: Option<Vec<FunctionDeclaration>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

fn tool_specs(toolbox: &Toolbox) -> Vec<ToolSpec> {
    let mut specs = Vec::new();
    if toolbox.web_search {
        specs.push(ToolSpec {
            google_search: Some(Value::Object(Default::default())),
            ..ToolSpec::default()
        });
    }
    let declarations = toolbox.declarations();
    if !declarations.is_empty() {
        specs.push(ToolSpec {
            function_declarations: Some(declarations),
            ..ToolSpec::default()
        });
    }
    specs
}

/// Some model versions refuse `googleSearch` alongside `functionDeclarations`
/// in one request.
fn mixes_search_and_functions(tools: &[ToolSpec]) -> bool {
    tools.iter().any(|t| t.google_search.is_some())
        && tools.iter().any(|t| t.function_declarations.is_some())
}

/// Concatenate the visible text of a turn, skipping thought parts.
fn visible_text(content: &Content) -> String {
    content
        .parts
        .iter()
        .filter(|p| p.thought != Some(true))
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
}

// ---------------------------------------------------------------------------
// GeminiModel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Auth {
    ApiKey(String),
    Bearer(String),
}

/// A Gemini model bound to one endpoint and credential.
#[derive(Debug, Clone)]
pub struct GeminiModel {
    client: Client,
    endpoint: String,
    auth: Auth,
}

impl GeminiModel {
    /// Bind `model` to the endpoint implied by `credential`.
    pub fn new(client: Client, settings: &ModelSettings, credential: Credential) -> Self {
        let model = &settings.model;
        match credential {
            Credential::ApiKey(key) => Self {
                client,
                endpoint: format!(
                    "{}/v1beta/models/{model}:generateContent",
                    settings.gemini_base.trim_end_matches('/')
                ),
                auth: Auth::ApiKey(key),
            },
            Credential::Project {
                project,
                location,
                access_token,
            } => Self {
                client,
                endpoint: format!(
                    "{}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent",
                    settings.vertex_base().trim_end_matches('/')
                ),
                auth: Auth::Bearer(access_token),
            },
        }
    }

    #[cfg(test)]
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: &GenerateRequest<'_>) -> Result<GenerateResponse, ModelError> {
        let mut req = self.client.post(&self.endpoint).json(request);
        req = match &self.auth {
            Auth::ApiKey(key) => req.header("x-goog-api-key", key),
            Auth::Bearer(token) => req.bearer_auth(token),
        };

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
            return Err(ModelError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(&self, prompt: &str, toolbox: &Toolbox) -> Result<String, ModelError> {
        let mut contents = vec![Content::user(vec![Part::text(prompt)])];
        let mut tools = tool_specs(toolbox);
        let mut rounds = 0;

        loop {
            let request = GenerateRequest {
                contents: &contents,
                tools: tools.clone(),
                generation_config: GenerationConfig {
                    response_modalities: vec!["TEXT".into()],
                },
            };
            let response = match self.send(&request).await {
                Err(ModelError::BadStatus { status: 400, body }) if mixes_search_and_functions(&tools) => {
                    warn!(%body, "search combined with function calling rejected, retrying with search only");
                    tools.retain(|t| t.google_search.is_some());
                    continue;
                }
                other => other?,
            };

            let candidate = response
                .candidates
                .into_iter()
                .next()
                .ok_or(ModelError::EmptyResponse)?;
            let content = candidate.content.unwrap_or_default();

            let calls: Vec<FunctionCall> = content
                .parts
                .iter()
                .filter_map(|p| p.function_call.clone())
                .collect();

            if calls.is_empty() {
                let text = visible_text(&content);
                if text.trim().is_empty() {
                    warn!(finish_reason = ?candidate.finish_reason, "model returned no text");
                    return Err(ModelError::EmptyResponse);
                }
                return Ok(text);
            }

            if rounds == MAX_TOOL_ROUNDS {
                return Err(ModelError::ToolRoundsExceeded(MAX_TOOL_ROUNDS));
            }
            rounds += 1;

            let mut responses = Vec::with_capacity(calls.len());
            for call in calls {
                debug!(function = %call.name, round = rounds, "model called function");
                let output = toolbox.dispatch(&call.name, &call.args).await;
                responses.push(Part {
                    function_response: Some(FunctionResponse {
                        name: call.name,
                        response: output,
                    }),
                    ..Part::default()
                });
            }

            contents.push(Content {
                role: Some("model".into()),
                parts: content.parts,
            });
            contents.push(Content::user(responses));
        }
    }
}

// ---------------------------------------------------------------------------
// GeminiProvider
// ---------------------------------------------------------------------------

/// Resolves credentials per request and hands out [`GeminiModel`]s sharing
/// one HTTP client.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    settings: ModelSettings,
}

impl GeminiProvider {
    pub fn new(settings: ModelSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(MODEL_TIMEOUT).build()?;
        Ok(Self { client, settings })
    }
}

impl ModelProvider for GeminiProvider {
    fn model_id(&self) -> &str {
        &self.settings.model
    }

    fn model_for(&self, api_key: Option<&str>) -> Result<Arc<dyn GenerativeModel>, ConfigError> {
        let credential = resolve_credential(api_key, &self.settings)?;
        Ok(Arc::new(GeminiModel::new(
            self.client.clone(),
            &self.settings,
            credential,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use tokio::net::TcpListener;

    use crate::tools::{FunctionDeclaration, Tool};

    /// Records every request body and replies from a script, in order.
    #[derive(Clone)]
    struct Script {
        replies: Arc<Mutex<Vec<Value>>>,
        seen: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
    }

    async fn scripted(
        State(script): State<Script>,
        Path(model_call): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        let key = headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        script.seen.lock().unwrap().push((model_call, key, body));
        let mut replies = script.replies.lock().unwrap();
        if replies.is_empty() {
            return (StatusCode::INTERNAL_SERVER_ERROR, "script exhausted").into_response();
        }
        Json(replies.remove(0)).into_response()
    }

    async fn spawn_model_server(replies: Vec<Value>) -> (String, Script) {
        let script = Script {
            replies: Arc::new(Mutex::new(replies)),
            seen: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new()
            .route("/v1beta/models/{model_call}", post(scripted))
            .with_state(script.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), script)
    }

    fn text_reply(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    fn call_reply(name: &str, args: Value) -> Value {
        json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "functionCall": { "name": name, "args": args } }]
                }
            }]
        })
    }

    fn model_at(base: &str) -> GeminiModel {
        let settings = ModelSettings {
            gemini_base: base.into(),
            ..ModelSettings::default()
        };
        GeminiModel::new(Client::new(), &settings, Credential::ApiKey("k-123".into()))
    }

    struct Lookup;

    #[async_trait]
    impl Tool for Lookup {
        fn declaration(&self) -> FunctionDeclaration {
            FunctionDeclaration {
                name: "lookup".into(),
                description: "Look something up.".into(),
                parameters: json!({ "type": "object" }),
            }
        }

        async fn call(&self, args: &Value) -> Value {
            json!({ "result": format!("looked up {}", args["q"]) })
        }
    }

    #[test]
    fn endpoints_follow_credential() {
        let settings = ModelSettings::default();
        let keyed = GeminiModel::new(Client::new(), &settings, Credential::ApiKey("k".into()));
        assert_eq!(
            keyed.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );

        let project = GeminiModel::new(
            Client::new(),
            &settings,
            Credential::Project {
                project: "p".into(),
                location: "us-central1".into(),
                access_token: "t".into(),
            },
        );
        assert_eq!(
            project.endpoint(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/p/locations/us-central1\
             /publishers/google/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn tool_specs_carry_search_and_functions() {
        let toolbox = Toolbox::new().with_web_search().with_function(Arc::new(Lookup));
        let specs = serde_json::to_value(tool_specs(&toolbox)).unwrap();
        assert_eq!(
            specs,
            json!([
                { "googleSearch": {} },
                { "functionDeclarations": [{
                    "name": "lookup",
                    "description": "Look something up.",
                    "parameters": { "type": "object" }
                }]}
            ])
        );
    }

    #[tokio::test]
    async fn plain_text_reply_is_returned() {
        let (base, script) = spawn_model_server(vec![text_reply("{\"claims\": []}")]).await;
        let model = model_at(&base);
        let out = model.generate("check this", &Toolbox::new().with_web_search()).await.unwrap();
        assert_eq!(out, "{\"claims\": []}");

        let seen = script.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "gemini-2.5-flash:generateContent");
        assert_eq!(seen[0].1.as_deref(), Some("k-123"));
        assert_eq!(seen[0].2["contents"][0]["parts"][0]["text"], "check this");
        assert_eq!(seen[0].2["generationConfig"]["responseModalities"], json!(["TEXT"]));
    }

    #[tokio::test]
    async fn function_calls_are_dispatched_and_answered() {
        let (base, script) = spawn_model_server(vec![
            call_reply("lookup", json!({ "q": "attention" })),
            text_reply("done"),
        ])
        .await;
        let model = model_at(&base);
        let toolbox = Toolbox::new().with_function(Arc::new(Lookup));
        let out = model.generate("go", &toolbox).await.unwrap();
        assert_eq!(out, "done");

        let seen = script.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let second = &seen[1].2["contents"];
        assert_eq!(second.as_array().unwrap().len(), 3);
        assert_eq!(second[1]["role"], "model");
        assert_eq!(second[1]["parts"][0]["functionCall"]["name"], "lookup");
        assert_eq!(second[2]["role"], "user");
        assert_eq!(
            second[2]["parts"][0]["functionResponse"],
            json!({ "name": "lookup", "response": { "result": "looked up \"attention\"" } })
        );
    }

    #[tokio::test]
    async fn endless_function_calls_are_cut_off() {
        let replies = (0..=MAX_TOOL_ROUNDS)
            .map(|_| call_reply("lookup", json!({ "q": "again" })))
            .collect();
        let (base, _script) = spawn_model_server(replies).await;
        let model = model_at(&base);
        let toolbox = Toolbox::new().with_function(Arc::new(Lookup));
        let err = model.generate("go", &toolbox).await.unwrap_err();
        assert!(matches!(err, ModelError::ToolRoundsExceeded(MAX_TOOL_ROUNDS)));
    }

    #[tokio::test]
    async fn rejected_tool_combination_retries_with_search_only() {
        let seen = Arc::new(Mutex::new(Vec::<Value>::new()));
        let app = Router::new()
            .route(
                "/v1beta/models/{model_call}",
                post(|State(seen): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>| async move {
                    seen.lock().unwrap().push(body.clone());
                    let tools = body["tools"].as_array().cloned().unwrap_or_default();
                    if tools.len() > 1 {
                        let err = json!({ "error": {
                            "code": 400,
                            "message": "Tool use with function calling is unsupported",
                            "status": "INVALID_ARGUMENT"
                        }});
                        return (StatusCode::BAD_REQUEST, Json(err)).into_response();
                    }
                    Json(text_reply("{\"claims\": []}")).into_response()
                }),
            )
            .with_state(seen.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let toolbox = Toolbox::new().with_web_search().with_function(Arc::new(Lookup));
        let out = model_at(&format!("http://{addr}"))
            .generate("go", &toolbox)
            .await
            .unwrap();
        assert_eq!(out, "{\"claims\": []}");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0]["tools"].as_array().unwrap().len(), 2);
        assert_eq!(seen[1]["tools"], json!([{ "googleSearch": {} }]));
    }

    #[tokio::test]
    async fn bad_request_without_combined_tools_is_reported() {
        let app = Router::new().route(
            "/v1beta/models/{model_call}",
            post(|| async { (StatusCode::BAD_REQUEST, "bad prompt") }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let toolbox = Toolbox::new().with_function(Arc::new(Lookup));
        let err = model_at(&format!("http://{addr}"))
            .generate("go", &toolbox)
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::BadStatus { status: 400, .. }));
    }

    #[tokio::test]
    async fn thought_parts_are_hidden() {
        let reply = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "let me think", "thought": true },
                    { "text": "answer" }
                ]}
            }]
        });
        let (base, _script) = spawn_model_server(vec![reply]).await;
        let out = model_at(&base).generate("q", &Toolbox::new()).await.unwrap();
        assert_eq!(out, "answer");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let (base, _script) = spawn_model_server(vec![]).await;
        let err = model_at(&base).generate("q", &Toolbox::new()).await.unwrap_err();
        match err {
            ModelError::BadStatus { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "script exhausted");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn no_candidates_is_empty_response() {
        let (base, _script) = spawn_model_server(vec![json!({ "candidates": [] })]).await;
        let err = model_at(&base).generate("q", &Toolbox::new()).await.unwrap_err();
        assert!(matches!(err, ModelError::EmptyResponse));
    }

    #[test]
    fn provider_without_credential_fails() {
        let provider = GeminiProvider::new(ModelSettings::default()).unwrap();
        assert_eq!(provider.model_id(), "gemini-2.5-flash");
        assert_eq!(
            provider.model_for(None).err(),
            Some(ConfigError::MissingCredential)
        );
        assert!(provider.model_for(Some("key")).is_ok());
    }
}
