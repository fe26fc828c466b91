use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::autosave::SaveError;
use crate::editor::session::EditorError;
use crate::editor::validation::SectionError;
use crate::gateway::GatewayError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("No resume is open in the editor")]
    NoSession,

    #[error("Remote API error: {0}")]
    Gateway(String),

    #[error("{0}")]
    SaveFailed(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::NotFound(msg) => AppError::NotFound(msg),
            GatewayError::Unauthorized(_) => AppError::Unauthorized,
            GatewayError::Validation(msg) => AppError::UnprocessableEntity(msg),
            other => AppError::Gateway(other.to_string()),
        }
    }
}

impl From<SaveError> for AppError {
    fn from(e: SaveError) -> Self {
        match e {
            SaveError::Closed => AppError::NoSession,
            e if e.is_fatal() => AppError::Unauthorized,
            e => AppError::SaveFailed(e.to_string()),
        }
    }
}

impl From<SectionError> for AppError {
    fn from(e: SectionError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<EditorError> for AppError {
    fn from(e: EditorError) -> Self {
        match e {
            EditorError::Invalid(e) => e.into(),
            EditorError::Gateway(e) => e.into(),
            EditorError::Save(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Session expired; please sign in again".to_string(),
            ),
            AppError::NoSession => (
                StatusCode::NOT_FOUND,
                "NO_SESSION",
                "No resume is open in the editor".to_string(),
            ),
            AppError::Gateway(msg) => {
                tracing::error!("Remote API error: {msg}");
                (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR", msg.clone())
            }
            AppError::SaveFailed(msg) => (StatusCode::BAD_GATEWAY, "SAVE_FAILED", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
