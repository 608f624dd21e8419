//! Direct citation lookup: `POST /api/check-citation`.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use vibecheck_api::{CitationCheckRequest, CitationCheckResponse};

use crate::error::AppError;

use super::AppState;

/// Look up one paper by title, optionally checking an author last name.
///
/// Index failures are reported inside the body (`found: false` plus
/// `error`), not as an HTTP error.
pub async fn check_citation(
    State(state): State<AppState>,
    payload: Result<Json<CitationCheckRequest>, JsonRejection>,
) -> Result<Json<CitationCheckResponse>, AppError> {
    let Json(req) = payload?;
    if req.title.trim().is_empty() {
        return Err(AppError::UnprocessableEntity("title must not be empty".into()));
    }

    let record = state
        .verifier
        .scholar()
        .verify_paper(req.title.trim(), req.author.as_deref())
        .await;
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    use super::super::test_support::{build_app, build_app_with, post_json, send};

    async fn search(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
        let query = q.get("query").cloned().unwrap_or_default().to_lowercase();
        if query.contains("attention") {
            Json(json!({
                "total": 1,
                "data": [{
                    "title": "Attention Is All You Need",
                    "year": 2017,
                    "url": "https://www.semanticscholar.org/paper/204e3073",
                    "citationCount": 120000,
                    "authors": [
                        { "name": "Ashish Vaswani" },
                        { "name": "Noam Shazeer" },
                        { "name": "Niki Parmar" },
                        { "name": "Jakob Uszkoreit" }
                    ]
                }]
            }))
        } else {
            Json(json!({ "total": 0, "data": [] }))
        }
    }

    async fn spawn_index() -> String {
        let app = Router::new().route("/graph/v1/paper/search", get(search));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn found_paper_with_matching_author() {
        let (app, _) = build_app_with(&spawn_index().await);
        let req = post_json(
            "/api/check-citation",
            json!({ "title": "Attention Is All You Need", "author": "Vaswani" }),
        );
        let (resp, body) = send(app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body["found"], true);
        assert_eq!(body["year"], 2017);
        assert_eq!(body["author_match"], true);
        assert_eq!(body["authors"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn author_mismatch_keeps_found() {
        let (app, _) = build_app_with(&spawn_index().await);
        let req = post_json(
            "/api/check-citation",
            json!({ "title": "Attention Is All You Need", "author": "Hinton" }),
        );
        let (_, body) = send(app, req).await;
        assert_eq!(body["found"], true);
        assert_eq!(body["author_match"], false);
    }

    #[tokio::test]
    async fn unknown_paper_is_not_found() {
        let (app, _) = build_app_with(&spawn_index().await);
        let req = post_json("/api/check-citation", json!({ "title": "Quantum Cheese Dynamics" }));
        let (resp, body) = send(app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body["found"], false);
        assert_eq!(body["error"], "Paper not found");
        assert!(body.get("author_match").is_none());
    }

    #[tokio::test]
    async fn unreachable_index_is_reported_in_body() {
        let (app, _) = build_app();
        let req = post_json("/api/check-citation", json!({ "title": "Anything" }));
        let (resp, body) = send(app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body["found"], false);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let (app, _) = build_app();
        let (resp, body) = send(app, post_json("/api/check-citation", json!({ "title": " " }))).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "validation_failed");
    }
}
