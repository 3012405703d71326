//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    AttachmentUpload, ErrorResponse, ModelInfo, ModelRequest, ModelsResponse, SendRequest,
    StageAttachmentResponse, SuccessResponse, WebSearchRequest,
};
use super::AppState;
use crate::gateway::wire::{CompletionReplyBody, CompletionRequestBody};
use crate::gateway::{GatewayError, GatewayErrorKind};
use crate::llm::{find_model, LlmRequest, GEMINI_API_KEY_ENV};
use crate::runtime::{Dispatch, SessionError};
use crate::session::{AttachmentId, Configuration, ConfigurationError, SessionSnapshot};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};

/// Prompt used when a completion request carries no input
pub const DEFAULT_INPUT: &str = "Explain how AI works in a few words.";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Completion endpoint used by HttpGateway
        .route("/api/chat", post(chat_completion))
        // Session
        .route("/api/session", get(get_session))
        .route("/api/session/stream", get(stream_session))
        .route("/api/session/send", post(send_message))
        .route("/api/session/regenerate", post(regenerate))
        .route("/api/session/model", post(set_model))
        .route("/api/session/web-search", post(set_web_search))
        .route("/api/session/attachments", post(stage_attachment))
        .route("/api/session/attachments/:id", delete(unstage_attachment))
        // Model info
        .route("/api/models", get(list_models))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Completion Endpoint
// ============================================================

/// Single-shot generation. A body that fails to parse is treated as empty.
async fn chat_completion(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CompletionReplyBody>, AppError> {
    let request: CompletionRequestBody = serde_json::from_slice(&body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Unparseable completion body, using defaults");
        CompletionRequestBody::default()
    });

    // Credential is checked before anything else, including the model id
    if !state.registry.has_credential() {
        let err = ConfigurationError::MissingCredential(GEMINI_API_KEY_ENV);
        return Err(GatewayError::from(err).into());
    }

    let model = request
        .model
        .unwrap_or_else(|| state.registry.default_model_id().to_string());
    let input = request.input.unwrap_or_else(|| DEFAULT_INPUT.to_string());

    let service = state.registry.service(&model).map_err(GatewayError::from)?;
    let response = service
        .complete(&LlmRequest::new(input).with_web_search(request.web_search))
        .await?;

    if response.text.is_empty() {
        Ok(Json(CompletionReplyBody::default()))
    } else {
        Ok(Json(CompletionReplyBody::text(response.text)))
    }
}

// ============================================================
// Session
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before taking the snapshot so nothing falls in between.
    // Updates the snapshot already covers are dropped by sequence.
    let updates = state.session.subscribe();
    sse_stream(state.session.snapshot(), updates)
}

async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<Json<Dispatch>, AppError> {
    let attachments = req
        .attachments
        .into_iter()
        .map(|upload| {
            upload
                .decode()
                .map_err(|e| AppError::BadRequest(format!("Invalid attachment data: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let dispatch = state.session.send(req.text, attachments).await?;
    Ok(Json(dispatch))
}

async fn regenerate(State(state): State<AppState>) -> Result<Json<Dispatch>, AppError> {
    Ok(Json(state.session.regenerate().await?))
}

async fn set_model(
    State(state): State<AppState>,
    Json(req): Json<ModelRequest>,
) -> Result<Json<Configuration>, AppError> {
    state.session.set_model(req.model).await?;
    Ok(Json(state.session.snapshot().config))
}

async fn set_web_search(
    State(state): State<AppState>,
    Json(req): Json<WebSearchRequest>,
) -> Result<Json<Configuration>, AppError> {
    state.session.set_web_search(req.enabled).await?;
    Ok(Json(state.session.snapshot().config))
}

async fn stage_attachment(
    State(state): State<AppState>,
    Json(upload): Json<AttachmentUpload>,
) -> Result<Json<StageAttachmentResponse>, AppError> {
    let attachment = upload
        .decode()
        .map_err(|e| AppError::BadRequest(format!("Invalid attachment data: {e}")))?;
    let id = state.session.stage_attachment(attachment).await?;
    Ok(Json(StageAttachmentResponse { id }))
}

async fn unstage_attachment(
    State(state): State<AppState>,
    Path(id): Path<AttachmentId>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.session.unstage_attachment(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Model Info
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = state
        .registry
        .available_models()
        .into_iter()
        .map(|id| match find_model(&id) {
            Some(def) => ModelInfo {
                id,
                display_name: def.display_name.to_string(),
                description: def.description.to_string(),
                context_window: def.context_window,
            },
            None => ModelInfo {
                display_name: id.clone(),
                id,
                description: String::new(),
                context_window: 0,
            },
        })
        .collect();

    Json(ModelsResponse {
        models,
        default: state.registry.default_model_id().to_string(),
    })
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("companion-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
    /// Failure reported by the provider, with the status to relay
    Upstream(StatusCode, String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Busy => AppError::Conflict(err.to_string()),
            SessionError::Configuration(_) => AppError::BadRequest(err.to_string()),
            SessionError::UnknownAttachment(_) => AppError::NotFound(err.to_string()),
            SessionError::Closed => AppError::Internal(err.to_string()),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        let status = match err.kind {
            GatewayErrorKind::Configuration => err
                .status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            GatewayErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            GatewayErrorKind::Auth => StatusCode::UNAUTHORIZED,
            GatewayErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            GatewayErrorKind::Network
            | GatewayErrorKind::ServerError
            | GatewayErrorKind::Unknown => StatusCode::BAD_GATEWAY,
        };
        AppError::Upstream(status, err.message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Upstream(status, msg) => (status, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
