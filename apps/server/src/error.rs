use std::io::Error as IoError;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use tcpingmap::ConfigFetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}

/// Errors surfaced to HTTP clients as `{"error": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No results available yet.")]
    NoResults,
    #[error("Target configuration unavailable: {0}")]
    ConfigUnavailable(#[source] ConfigFetchError),
    #[error("Target configuration is served from a remote source and cannot be updated")]
    ReadOnly,
    #[error("Invalid target configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to store target configuration: {0}")]
    Store(#[source] ConfigFetchError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoResults => StatusCode::NOT_FOUND,
            ApiError::ConfigUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ReadOnly => StatusCode::CONFLICT,
            ApiError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<ConfigFetchError> for ApiError {
    fn from(e: ConfigFetchError) -> Self {
        match e {
            ConfigFetchError::ReadOnly => ApiError::ReadOnly,
            other => ApiError::Store(other),
        }
    }
}
