use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Wrapper for API responses that automatically adds success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub status_code: Option<StatusCode>,
    /// Sibling fields of `data` (`message`, `count`, `pagination`)
    pub extra: Map<String, Value>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self { data: Some(data), status_code: None, extra: Map::new() }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self { status_code: Some(StatusCode::CREATED), ..Self::success(data) }
    }

    pub fn message(self, message: impl Into<String>) -> Self {
        self.with("message", Value::String(message.into()))
    }

    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.extra.insert(key.to_string(), value);
        self
    }
}

impl ApiResponse<()> {
    /// Envelope with a message and no data
    pub fn message_only(message: impl Into<String>) -> Self {
        Self { data: None, status_code: None, extra: Map::new() }.message(message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let mut envelope = Map::new();
        envelope.insert("success".to_string(), Value::Bool(true));

        if let Some(data) = self.data {
            // Convert data to JSON Value for consistent envelope format
            match serde_json::to_value(&data) {
                Ok(value) => {
                    envelope.insert("data".to_string(), value);
                }
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "success": false,
                            "message": "Failed to serialize response data",
                            "code": "INTERNAL_SERVER_ERROR"
                        })),
                    )
                        .into_response();
                }
            }
        }
        envelope.extend(self.extra);

        (status, Json(Value::Object(envelope))).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
