//! API and catalog errors
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use formgate_core::FormError;
use serde_json::json;
use thiserror::Error;

/// Failures while loading the form catalog at startup.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("LOAD/IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("LOAD/FORM: {file}: {source}")]
    Form { file: String, source: FormError },

    #[error("LOAD/DUPLICATE: form '{0}' is defined more than once")]
    DuplicateIdentifier(String),
}

/// Request-level failures.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("form '{0}' not found")]
    FormNotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::FormNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
