use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Wrapper for API responses.
///
/// Writes return `{"success": true, "<key>": data}`; listings return the data as-is.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub key: Option<&'static str>,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success envelope with the payload under `key`
    pub fn success(key: &'static str, data: T) -> Self {
        Self {
            data,
            key: Some(key),
            status_code: None, // Default to 200 OK
        }
    }

    /// Payload serialized without an envelope
    pub fn bare(data: T) -> Self {
        Self {
            data,
            key: None,
            status_code: None,
        }
    }

    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = Some(status_code);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to serialize response data" })),
                )
                    .into_response();
            }
        };

        let body = match self.key {
            Some(key) => {
                let mut envelope = Map::new();
                envelope.insert("success".into(), Value::Bool(true));
                envelope.insert(key.into(), data_value);
                Value::Object(envelope)
            }
            None => data_value,
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
