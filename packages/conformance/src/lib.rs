//! Shared helpers for the VibeCheck conformance test suite.
//!
//! [`spawn_upstream`] starts one loopback server that stands in for every
//! outbound dependency: the model's `generateContent` endpoint, the academic
//! search index, and a few web pages. [`spawn_server`] starts the real
//! service pointed at it. Tests then talk plain HTTP to both.
//!
//! The fake model is deterministic and driven by the prompt it receives:
//!
//! | Prompt contains | Reply |
//! |-----------------|-------|
//! | a `functionResponse` turn | one CITATION claim, VERIFIED iff the lookup said `FOUND` |
//! | `Vaswani` | a `verify_paper_tool` call for "Attention Is All You Need" |
//! | `Johnson et al.` | a `verify_paper_tool` call for a paper the index lacks |
//! | `BROKEN/INACCESSIBLE` | one BROKEN_URL claim |
//! | `Title: History of Python` | one URL claim marked HALLUCINATION |
//! | anything else | one FACT claim, VERIFIED, quoting the analysed text |

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Query,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use vibecheck::{ModelSettings, Verifier, VerifierConfig};
use vibecheck_server::{build_router, ServerConfig};

/// The only API key the fake model accepts.
pub const UPSTREAM_KEY: &str = "conformance-key";

/// Model identifier the spawned server is configured with.
pub const MODEL_ID: &str = "conformance-model";

const ANALYSE_MARKER: &str = "TEXT TO ANALYZE:\n";

fn report(claim: Value) -> Value {
    let text = json!({ "claims": [claim] }).to_string();
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": format!("```json\n{text}\n```") }]
            },
            "finishReason": "STOP"
        }]
    })
}

fn claim(text: &str, kind: &str, status: &str, reasoning: &str, correction: Option<&str>) -> Value {
    json!({
        "original_text": text,
        "type": kind,
        "status": status,
        "reasoning": reasoning,
        "correction": correction,
        "source_url": null,
        "confidence_score": 90
    })
}

async fn generate_content(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(UPSTREAM_KEY) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": { "code": 403, "message": "API key not valid" } })),
        )
            .into_response();
    }

    let empty = Vec::new();
    let contents = body["contents"].as_array().unwrap_or(&empty);
    let prompt = contents
        .first()
        .and_then(|c| c["parts"][0]["text"].as_str())
        .unwrap_or_default();
    let analysed = prompt
        .rsplit_once(ANALYSE_MARKER)
        .map(|(_, t)| t)
        .unwrap_or(prompt);

    if let Some(result) = contents
        .last()
        .and_then(|c| c["parts"][0]["functionResponse"]["response"]["result"].as_str())
    {
        let status = if result.starts_with("FOUND") {
            "VERIFIED"
        } else {
            "HALLUCINATION"
        };
        let correction = (status == "HALLUCINATION")
            .then_some("[CITATION REMOVED: Reference could not be verified]");
        return Json(report(claim(analysed, "CITATION", status, result, correction))).into_response();
    }

    let lookup = if prompt.contains("Vaswani") {
        Some("Attention Is All You Need")
    } else if prompt.contains("Johnson et al.") {
        Some("Johnson quantum hardware neural network energy")
    } else {
        None
    };
    if let Some(query) = lookup {
        return Json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{
                        "functionCall": {
                            "name": "verify_paper_tool",
                            "args": { "query": query }
                        }
                    }]
                }
            }]
        }))
        .into_response();
    }

    let reply = if prompt.contains("BROKEN/INACCESSIBLE") {
        claim(analysed, "URL", "BROKEN_URL", "The URL returns an error.", Some("No working alternative found."))
    } else if prompt.contains("Title: History of Python") {
        claim(
            analysed,
            "URL",
            "HALLUCINATION",
            "The page says Python was created in 1991.",
            Some("Python was created in 1991."),
        )
    } else {
        claim(analysed, "FACT", "VERIFIED", "Consistent with search results.", None)
    };
    Json(report(reply)).into_response()
}

async fn paper_search(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let query = q.get("query").cloned().unwrap_or_default().to_lowercase();
    if query.contains("attention is all you need") {
        Json(json!({
            "total": 1,
            "offset": 0,
            "data": [{
                "paperId": "204e3073870fae3d05bcbc2f6a8e263d9b72e776",
                "title": "Attention Is All You Need",
                "year": 2017,
                "url": "https://www.semanticscholar.org/paper/204e3073870fae3d05bcbc2f6a8e263d9b72e776",
                "abstract": "The dominant sequence transduction models...",
                "citationCount": 120000,
                "authors": [
                    { "authorId": "40348417", "name": "Ashish Vaswani" },
                    { "authorId": "1846258", "name": "Noam Shazeer" },
                    { "authorId": "3877127", "name": "Niki Parmar" },
                    { "authorId": "39328010", "name": "Jakob Uszkoreit" }
                ]
            }]
        }))
    } else {
        Json(json!({ "total": 0, "offset": 0, "data": [] }))
    }
}

async fn article() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        "<html><head><title>History of Python</title></head>\
         <body><nav>Home</nav><p>Python was created in 1991 by Guido van Rossum.</p></body></html>",
    )
}

/// Start the fake upstream and return its base URL, e.g. `http://127.0.0.1:51234`.
///
/// Pages live under `/pages/article` (HTML) and `/pages/missing` (404).
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound.
pub async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/v1beta/models/{model_call}", post(generate_content))
        .route("/graph/v1/paper/search", get(paper_search))
        .route("/pages/article", get(article))
        .route("/pages/missing", get(|| async { StatusCode::NOT_FOUND }));
    let addr = serve(app).await;
    format!("http://{addr}")
}

/// Start an in-process server against `upstream` and return its base URL.
///
/// When `server_key` is `None` the server has no credential of its own and
/// every verify request must carry `api_key`.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound or the verifier cannot be built.
pub async fn spawn_server(upstream: &str, server_key: Option<&str>) -> String {
    let config = ServerConfig {
        verifier: VerifierConfig {
            model: ModelSettings {
                model: MODEL_ID.into(),
                gemini_api_key: server_key.map(str::to_string),
                gemini_base: upstream.into(),
                ..ModelSettings::default()
            },
            scholar_base: upstream.into(),
            scholar_api_key: None,
        },
        ..ServerConfig::default()
    };
    let verifier = Verifier::from_config(&config.verifier).expect("build verifier");
    let router = build_router(Arc::new(verifier), &config);
    let addr = serve(router).await;
    format!("http://{addr}")
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("conformance server error");
    });
    addr
}
