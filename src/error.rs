//! Unified error types for turnstile's outer layers.
//! Used by: config, handlers, storage, main.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Incorrect account or password.")]
    Unauthorized,

    #[error("You have not enough permission for this operation: {0}")]
    Forbidden(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("upload failed: {0}")]
    Multipart(#[from] MultipartError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Validation(_) | Error::Multipart(_) => StatusCode::BAD_REQUEST,
            Error::Io(_) | Error::Config(_) | Error::ConfigParse(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, format!("{self}\n")).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
