use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

/// Domain errors surfaced at the handler boundary. Everything else funnels
/// into `Internal` via the blanket `From` below and is logged, never echoed.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    InvalidOperation(String),
    Conflict(String),
    Unauthorized,
    UploadError(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::InvalidOperation(message) => (StatusCode::BAD_REQUEST, message),
            Self::Conflict(message) => (StatusCode::CONFLICT, message),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "not logged in".to_owned()),
            Self::UploadError(message) => (StatusCode::BAD_GATEWAY, message),
            Self::Internal(err) => {
                tracing::error!("internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}
