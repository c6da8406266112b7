use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Catalog API error {status}: {message}")]
    Catalog { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            MonitorError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            MonitorError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            MonitorError::Storage(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            MonitorError::Catalog { .. } => (StatusCode::BAD_GATEWAY, self.to_string()),
            MonitorError::Parse(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            MonitorError::Http(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            MonitorError::Json(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            MonitorError::Csv(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            MonitorError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            MonitorError::UrlParse(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            MonitorError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
