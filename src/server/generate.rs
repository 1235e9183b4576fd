use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use super::AppState;
use crate::types::{DispatchRequest, GatewayError, GenerateRequest, Result};

pub const MODEL_HEADER: HeaderName = HeaderName::from_static("x-gateway-model");
pub const ATTEMPTS_HEADER: HeaderName = HeaderName::from_static("x-gateway-attempts");

/// `POST /generate`. Answers with the completion text as a plain-text body.
pub async fn generate_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let request = DispatchRequest::from(request);

    tracing::info!(
        model = %request.model_name,
        structured_output = request.wants_structured_output,
        "Received generate request"
    );

    let completion = state.dispatcher.dispatch(&request).await?;

    let model = HeaderValue::from_str(&completion.model)
        .map_err(|e| GatewayError::Internal(format!("Invalid model header value: {}", e)))?;
    let attempts = HeaderValue::from(completion.attempts);

    Ok((
        [(MODEL_HEADER, model), (ATTEMPTS_HEADER, attempts)],
        completion.text,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{GenerativeModel, ModelError};
    use crate::config::{LoggingConfig, RetryConfig};
    use crate::dispatch::Dispatcher;
    use crate::server::router;
    use crate::types::gemini::{Candidate, Content, GenerateContentResponse, Part, SafetySetting};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Answers every call with the same result.
    struct FixedModel {
        result: std::result::Result<GenerateContentResponse, ModelError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerativeModel for FixedModel {
        async fn generate(
            &self,
            _model: &str,
            _prompt: &str,
            _safety_settings: &[SafetySetting],
        ) -> std::result::Result<GenerateContentResponse, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn answering(text: &str) -> Arc<FixedModel> {
        Arc::new(FixedModel {
            result: Ok(GenerateContentResponse {
                candidates: vec![Candidate {
                    content: Some(Content {
                        role: Some("model".to_string()),
                        parts: vec![Part {
                            text: Some(text.to_string()),
                        }],
                    }),
                    finish_reason: None,
                }],
                ..Default::default()
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(result: std::result::Result<GenerateContentResponse, ModelError>) -> Arc<FixedModel> {
        Arc::new(FixedModel {
            result,
            calls: AtomicUsize::new(0),
        })
    }

    fn app(model: Arc<FixedModel>) -> axum::Router {
        let dispatcher = Dispatcher::new(
            model,
            RetryConfig::default(),
            "gemini-2.5-flash",
            LoggingConfig::default(),
        );
        router(AppState {
            dispatcher: Arc::new(dispatcher),
        })
    }

    fn post_generate(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_plain_text() {
        let model = answering("```json\n{\"a\":1}\n```");
        let response = app(model.clone())
            .oneshot(post_generate(
                r#"{"model_name": "gemini-2.5-pro", "prompt": "hi", "is_json_output": true}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[&MODEL_HEADER], "gemini-2.5-pro");
        assert_eq!(response.headers()[&ATTEMPTS_HEADER], "1");
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"a":1}"#);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_prompt_is_bad_request() {
        let model = answering("unused");
        let response = app(model.clone())
            .oneshot(post_generate(r#"{"model_name": "gemini-2.5-pro"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "invalid_request");
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let response = app(answering("unused"))
            .oneshot(post_generate("{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "invalid_request");
    }

    #[tokio::test]
    async fn test_blocked_response_carries_details() {
        let model = failing(Ok(GenerateContentResponse {
            prompt_feedback: Some(json!({"blockReason": "SAFETY"})),
            ..Default::default()
        }));
        let response = app(model.clone())
            .oneshot(post_generate(r#"{"model_name": "gemini-2.5-pro", "prompt": "hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "blocked");
        assert_eq!(body["error"]["attempts"], 1);
        assert_eq!(body["error"]["details"]["blockReason"], "SAFETY");
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_client_error_is_bad_gateway() {
        let model = failing(Err(ModelError::new(
            "Gemini API error [401 Unauthorized]: API key not valid",
        )));
        let response = app(model)
            .oneshot(post_generate(r#"{"model_name": "gemini-2.5-pro", "prompt": "hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "upstream_error");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(answering("unused"))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }
}
