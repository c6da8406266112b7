//! Request extractors whose rejections use the v1 error envelope.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};

use super::v1::response::ApiResponse;
use crate::error::MonitorError;

pub struct ApiRejection(MonitorError);

impl IntoResponse for ApiRejection {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self.0).into_response()
    }
}

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiRejection))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiRejection))]
pub struct AppQuery<T>(pub T);

impl From<JsonRejection> for ApiRejection {
    fn from(rejection: JsonRejection) -> Self {
        Self(map_json_rejection(rejection))
    }
}

impl From<QueryRejection> for ApiRejection {
    fn from(rejection: QueryRejection) -> Self {
        Self(MonitorError::Validation(format!(
            "Invalid query parameters: {}",
            rejection.body_text()
        )))
    }
}

fn map_json_rejection(rejection: JsonRejection) -> MonitorError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                MonitorError::Validation(format!("Missing required field: {field}"))
            } else {
                MonitorError::Validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            MonitorError::Validation(format!("JSON syntax error: {err}"))
        }
        JsonRejection::MissingJsonContentType(_) => MonitorError::Validation(
            "Missing `Content-Type: application/json` header".to_string(),
        ),
        JsonRejection::BytesRejection(_) => {
            MonitorError::Internal("Failed to read request body".to_string())
        }
        _ => MonitorError::Validation(rejection.body_text()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_is_extracted() {
        let message = "Failed to deserialize the JSON body: missing field `organizationId` at line 1";
        assert_eq!(extract_missing_field(message), Some("organizationId"));
        assert_eq!(extract_missing_field("unknown variant `x`"), None);
    }
}
