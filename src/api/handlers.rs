//! HTTP request handlers

use super::sse::{sse_stream, InitEvent};
use super::types::{
    ApiKeyRequest, EndSessionRequest, ErrorResponse, MessagesResponse, ModelInfo, ModelsResponse,
    SendMessageRequest, SettingsResponse, SuccessResponse, SummaryResponse, TemplatesResponse,
};
use super::AppState;
use crate::llm::{all_models, ChatModel};
use crate::persona::templates;
use crate::session::{Exchange, SessionError};
use crate::store::StoreError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use tokio::task::JoinError;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Thread
        .route(
            "/api/messages",
            get(get_messages).post(send_message).delete(clear_messages),
        )
        .route("/api/session/end", post(end_session))
        // Live updates
        .route("/api/stream", get(stream_session))
        // Pickers
        .route("/api/models", get(list_models))
        .route("/api/templates", get(list_templates))
        // API key
        .route("/api/settings", get(get_settings))
        .route(
            "/api/settings/api-key",
            put(set_api_key).delete(remove_api_key),
        )
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Thread
// ============================================================

async fn get_messages(State(state): State<AppState>) -> Json<MessagesResponse> {
    Json(MessagesResponse {
        messages: state.controller.messages(),
        thinking: state.controller.is_thinking(),
    })
}

async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Exchange>, AppError> {
    let model = resolve_model(req.model.as_deref(), state.default_model)?;

    // Runs on its own task so a closed connection does not abandon the request
    let controller = state.controller.clone();
    let task = tokio::spawn(async move {
        controller.send_message(&req.text, model).await
    });
    let exchange = task.await??;

    Ok(Json(exchange))
}

async fn clear_messages(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.controller.clear()?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn end_session(
    State(state): State<AppState>,
    Json(req): Json<EndSessionRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    let model = resolve_model(req.model.as_deref(), state.default_model)?;

    let controller = state.controller.clone();
    let task = tokio::spawn(async move { controller.send_summary(model).await });
    let reply = task.await??;

    Ok(Json(SummaryResponse { reply }))
}

fn resolve_model(requested: Option<&str>, default: ChatModel) -> Result<ChatModel, AppError> {
    match requested {
        Some(id) => id.parse().map_err(AppError::BadRequest),
        None => Ok(default),
    }
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe first so nothing between the snapshot and the stream is lost
    let broadcast_rx = state.controller.subscribe();
    let init = InitEvent {
        messages: state.controller.messages(),
        thinking: state.controller.is_thinking(),
    };
    sse_stream(init, broadcast_rx)
}

// ============================================================
// Models and Templates
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = all_models()
        .iter()
        .map(|def| ModelInfo {
            id: def.model.api_name().to_string(),
            label: def.label.to_string(),
            description: def.description.to_string(),
        })
        .collect();

    Json(ModelsResponse {
        models,
        default: state.default_model.api_name().to_string(),
    })
}

async fn list_templates() -> Json<TemplatesResponse> {
    Json(TemplatesResponse {
        templates: templates().to_vec(),
    })
}

// ============================================================
// Settings
// ============================================================

async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        has_api_key: state.controller.credentials().is_present(),
    })
}

async fn set_api_key(
    State(state): State<AppState>,
    Json(req): Json<ApiKeyRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.controller.credentials().set(&req.api_key)?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn remove_api_key(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.controller.credentials().clear()?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("solace ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    MissingCredential(String),
    Conflict(String),
    Upstream(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::MissingCredential => AppError::MissingCredential(e.to_string()),
            SessionError::EmptyInput => AppError::BadRequest(e.to_string()),
            SessionError::Busy => AppError::Conflict(e.to_string()),
            SessionError::Request(e) => {
                AppError::Upstream(format!("Error: {} please try again later", e.message))
            }
            SessionError::InvalidTransition(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EmptyCredential => AppError::BadRequest(e.to_string()),
            StoreError::Kv(_) | StoreError::MalformedHistory(_) => {
                tracing::error!(error = %e, "Storage failure");
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl From<JoinError> for AppError {
    fn from(e: JoinError) -> Self {
        tracing::error!(error = %e, "Session task failed");
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            AppError::MissingCredential(msg) => (
                StatusCode::PRECONDITION_FAILED,
                ErrorResponse::new(msg).with_kind("missing_credential"),
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse::new(msg).with_kind("busy"),
            ),
            AppError::Upstream(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::new(msg).with_kind("request_failed"),
            ),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg)),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, LlmResponse, LlmService};
    use crate::request::RequestClient;
    use crate::sanitize::WordListFilter;
    use crate::session::SessionController;
    use crate::store::{CredentialStore, KvStore, MemoryKv, MessageStore};
    use crate::testing::MockLlmService;
    use axum::body::{Body, BodyDataStream};
    use axum::http::{Method, Request};
    use futures::StreamExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<MockLlmService>) {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::default());
        let llm = Arc::new(MockLlmService::new());
        let service: Arc<dyn LlmService> = llm.clone();
        let controller = SessionController::new(
            MessageStore::load(kv.clone()),
            CredentialStore::new(kv),
            RequestClient::new(service),
            Arc::new(WordListFilter::default()),
        );
        let state = AppState::new(controller, ChatModel::Gpt35Turbo);
        (create_router(state), llm)
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        call(app, empty_request(Method::GET, uri)).await
    }

    async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
        call(app, empty_request(Method::DELETE, uri)).await
    }

    async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        call(app, json_request(Method::POST, uri, &body)).await
    }

    async fn put(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        call(app, json_request(Method::PUT, uri, &body)).await
    }

    async fn store_key(app: &Router) {
        let body = json!({"api_key": "valid-key"});
        let (status, _) = put(app, "/api/settings/api-key", body).await;
        assert_eq!(status, StatusCode::OK);
    }

    /// Read one SSE frame and split it into event name and JSON data
    async fn next_event(frames: &mut BodyDataStream) -> (String, Value) {
        let chunk = frames.next().await.unwrap().unwrap();
        let text = String::from_utf8(chunk.to_vec()).unwrap();

        let mut name = String::new();
        let mut data = Value::Null;
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix("event:") {
                name = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("data:") {
                data = serde_json::from_str(rest.trim()).unwrap();
            }
        }
        (name, data)
    }

    #[tokio::test]
    async fn test_send_without_key_is_precondition_failure() {
        let (app, llm) = app();

        let (status, body) = post(&app, "/api/messages", json!({"text": "hello"})).await;

        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["kind"], "missing_credential");
        assert!(llm.recorded_calls().is_empty());

        let (_, body) = get(&app, "/api/messages").await;
        assert_eq!(body["messages"], json!([]));
    }

    #[tokio::test]
    async fn test_send_returns_both_turns() {
        let (app, llm) = app();
        store_key(&app).await;
        llm.queue_response(LlmResponse::text("Here is a plan..."));

        let request = json!({"text": "Plan a trip to Paris", "model": "gpt-4"});
        let (status, body) = post(&app, "/api/messages", request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_turn"]["text"], "Plan a trip to Paris");
        assert_eq!(body["user_turn"]["isFromAssistant"], false);
        assert_eq!(body["reply"]["text"], "Here is a plan...");
        assert_eq!(body["reply"]["isFromAssistant"], true);
        assert_eq!(llm.recorded_calls()[0].request.model, ChatModel::Gpt4);

        let (_, body) = get(&app, "/api/messages").await;
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["thinking"], false);
    }

    #[tokio::test]
    async fn test_bad_input_is_rejected() {
        let (app, _) = app();
        store_key(&app).await;

        let (status, _) = post(&app, "/api/messages", json!({"text": "  "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = json!({"text": "hi", "model": "gpt-9"});
        let (status, body) = post(&app, "/api/messages", request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown model: gpt-9");
    }

    #[tokio::test]
    async fn test_provider_failure_is_bad_gateway() {
        let (app, llm) = app();
        store_key(&app).await;
        llm.queue_error(LlmError::auth("Authentication failed: invalid key"));

        let (status, body) = post(&app, "/api/messages", json!({"text": "hi"})).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body["error"],
            "Error: Authentication failed: invalid key please try again later"
        );

        let (_, body) = get(&app, "/api/messages").await;
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_summary_and_clear() {
        let (app, llm) = app();
        store_key(&app).await;
        llm.queue_response(LlmResponse::text("Tell me more"));
        llm.queue_response(LlmResponse::text("- You talked about work"));

        post(&app, "/api/messages", json!({"text": "Work"})).await;
        let (status, body) = post(&app, "/api/session/end", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"]["text"], "- You talked about work");

        let (status, _) = delete(&app, "/api/messages").await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = get(&app, "/api/messages").await;
        assert_eq!(body["messages"], json!([]));
    }

    #[tokio::test]
    async fn test_stream_sends_snapshot_then_updates() {
        let (app, llm) = app();
        store_key(&app).await;
        llm.queue_response(LlmResponse::text("Tell me more"));
        post(&app, "/api/messages", json!({"text": "Work"})).await;

        let request = empty_request(Method::GET, "/api/stream");
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/event-stream");
        let mut frames = response.into_body().into_data_stream();

        let (name, data) = next_event(&mut frames).await;
        assert_eq!(name, "init");
        assert_eq!(data["type"], "init");
        assert_eq!(data["thinking"], false);
        let messages = data["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["text"], "Work");
        assert_eq!(messages[1]["isFromAssistant"], true);

        delete(&app, "/api/messages").await;
        let (name, data) = next_event(&mut frames).await;
        assert_eq!(name, "cleared");
        assert_eq!(data["type"], "cleared");
    }

    #[tokio::test]
    async fn test_stream_relays_exchange_events() {
        let (app, llm) = app();
        store_key(&app).await;
        llm.queue_response(LlmResponse::text("I hear you"));

        let request = empty_request(Method::GET, "/api/stream");
        let response = app.clone().oneshot(request).await.unwrap();
        let mut frames = response.into_body().into_data_stream();
        let (name, data) = next_event(&mut frames).await;
        assert_eq!(name, "init");
        assert_eq!(data["messages"], json!([]));

        post(&app, "/api/messages", json!({"text": "Long week"})).await;

        let (name, data) = next_event(&mut frames).await;
        assert_eq!(name, "message");
        assert_eq!(data["message"]["text"], "Long week");

        let (name, data) = next_event(&mut frames).await;
        assert_eq!(name, "state_change");
        assert_eq!(data["thinking"], true);

        let (name, data) = next_event(&mut frames).await;
        assert_eq!(name, "message");
        assert_eq!(data["message"]["isFromAssistant"], true);

        let (name, data) = next_event(&mut frames).await;
        assert_eq!(name, "state_change");
        assert_eq!(data["thinking"], false);
    }

    #[tokio::test]
    async fn test_api_key_lifecycle() {
        let (app, _) = app();

        let (_, body) = get(&app, "/api/settings").await;
        assert_eq!(body["has_api_key"], false);

        let blank = json!({"api_key": "   "});
        let (status, _) = put(&app, "/api/settings/api-key", blank).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        store_key(&app).await;
        let (_, body) = get(&app, "/api/settings").await;
        assert_eq!(body["has_api_key"], true);

        let (status, _) = delete(&app, "/api/settings/api-key").await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = get(&app, "/api/settings").await;
        assert_eq!(body["has_api_key"], false);
    }

    #[tokio::test]
    async fn test_models_and_templates() {
        let (app, _) = app();

        let (_, body) = get(&app, "/api/models").await;
        assert_eq!(body["default"], "gpt-3.5-turbo");
        assert_eq!(body["models"].as_array().unwrap().len(), 2);

        let (_, body) = get(&app, "/api/templates").await;
        let listed = body["templates"].as_array().unwrap().len();
        assert_eq!(listed, templates().len());
    }
}
