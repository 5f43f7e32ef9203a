pub mod convert;
pub mod error;
pub mod health;

use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::AppState;

/// Tag each request with an `x-request-id` and log its outcome.
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(request).await;

    info!(
        %request_id,
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Handled request"
    );
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/prompt/process", post(convert::process))
        .route("/prompt/convert", post(convert::convert))
        .route("/reasoning/budget", post(convert::reasoning_budget));

    Router::new()
        .route("/health", get(health::health))
        .route("/version", get(health::version))
        .nest("/v1", api_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use prompt_converter::constants::DEFAULT_PROMPT_PLACEHOLDER;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            placeholder: DEFAULT_PROMPT_PLACEHOLDER.to_string(),
            mistral_prefix: true,
            cache_ttl: "1h".to_string(),
        })
    }

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
        let app = build_router(test_state());
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        assert!(response.headers().contains_key("x-request-id"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state());
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn version_endpoint_names_package() {
        let app = build_router(test_state());
        let req = Request::builder().uri("/version").body(Body::empty()).unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["name"], "prompt-converter");
        assert_eq!(body["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn process_merges_messages() {
        let (status, body) = post_json(
            "/v1/prompt/process",
            json!({
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "user", "content": "there"}
                ],
                "processing": "merge"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"messages": [{"role": "user", "content": "hi\n\nthere"}]}));
    }

    #[tokio::test]
    async fn convert_uses_configured_defaults() {
        let (status, body) = post_json(
            "/v1/prompt/convert",
            json!({
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "Sure,"}
                ],
                "target": {"provider": "mistral"}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"][1]["prefix"], true);

        let (_, body) = post_json(
            "/v1/prompt/convert",
            json!({
                "messages": [{"role": "user", "content": "hi"}],
                "char_name": "Nia",
                "target": {"provider": "claude", "cache_depth": 0}
            }),
        )
        .await;
        assert_eq!(
            body["messages"][0]["content"][0]["cache_control"],
            json!({"type": "ephemeral", "ttl": "1h"})
        );
    }

    #[tokio::test]
    async fn convert_rejects_unknown_provider() {
        let (status, body) = post_json(
            "/v1/prompt/convert",
            json!({"messages": [], "target": {"provider": "palm"}}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["type"], "error");
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn openrouter_empty_content_is_contract_error() {
        let (status, body) = post_json(
            "/v1/prompt/convert",
            json!({
                "messages": [{"role": "user", "content": []}],
                "target": {"provider": "openrouter_claude", "cache_depth": 0}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn reasoning_budget_endpoint() {
        let (status, body) = post_json(
            "/v1/reasoning/budget",
            json!({"provider": "claude", "max_tokens": 100000, "effort": "max"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"budget_tokens": 21333}));

        let (_, body) = post_json(
            "/v1/reasoning/budget",
            json!({"provider": "google", "max_tokens": 8000, "effort": "minimal", "model": "gemini-2.5-pro"}),
        )
        .await;
        assert_eq!(body, json!({"budget_tokens": 128}));

        let (_, body) = post_json(
            "/v1/reasoning/budget",
            json!({"provider": "claude", "max_tokens": 8000}),
        )
        .await;
        assert_eq!(body, json!({"budget_tokens": null}));
    }
}
