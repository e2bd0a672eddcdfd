// HTTP API Error Types
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::services::ServiceError;
use crate::store::StoreError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    Validation { message: String, errors: Vec<String> },
    // Duplicate admin email; reported as 400 like other rejected writes
    Conflict(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    Internal { message: String, error: Option<String> },

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation { .. } | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
            ApiError::Validation { message, .. } | ApiError::Internal { message, .. } => message,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal { .. } => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "message": self.message(),
            "code": self.error_code(),
        });
        match self {
            ApiError::Validation { errors, .. } if !errors.is_empty() => response["errors"] = json!(errors),
            ApiError::Internal { error: Some(error), .. } => response["error"] = json!(error),
            _ => {}
        }
        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(message: impl Into<String>, errors: Vec<String>) -> Self {
        ApiError::Validation { message: message.into(), errors }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>, error: impl std::fmt::Display) -> Self {
        ApiError::Internal { message: message.into(), error: Some(error.to_string()) }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    /// Maps a service failure, using `message` for the 500 case
    pub fn context(message: &'static str) -> impl Fn(ServiceError) -> ApiError {
        move |err| match err {
            ServiceError::Invalid(invalid) => ApiError::validation(invalid.message, invalid.errors),
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Unauthorized(msg) => ApiError::unauthorized(msg),
            ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ServiceError::Store(StoreError::Filter(e)) => ApiError::bad_request(e.to_string()),
            other => {
                tracing::error!("{}: {}", message, other);
                ApiError::internal(message, other)
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::context("Server error while processing request")(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(format!("Invalid query string: {}", rejection.body_text()))
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Invalid;

    #[test]
    fn envelope_shapes() {
        let err = ApiError::validation("Validation error", vec!["price is required".to_string()]);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_json(),
            json!({ "success": false, "message": "Validation error", "code": "VALIDATION_ERROR", "errors": ["price is required"] })
        );

        let err = ApiError::internal("Server error while fetching products", "connection reset");
        assert_eq!(err.to_json()["error"], "connection reset");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::service_unavailable("database unavailable");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            err.to_json(),
            json!({ "success": false, "message": "database unavailable", "code": "SERVICE_UNAVAILABLE" })
        );
    }

    #[test]
    fn service_errors_map_to_statuses() {
        let map = ApiError::context("ctx");
        assert_eq!(map(ServiceError::NotFound("Product not found")).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(map(ServiceError::Conflict("dup".into())).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(map(ServiceError::Conflict("dup".into())).error_code(), "CONFLICT");
        assert_eq!(map(ServiceError::Forbidden("no".into())).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            map(ServiceError::Invalid(Invalid::fields(vec!["x".into()]))).status_code(),
            StatusCode::BAD_REQUEST
        );
        let internal = map(ServiceError::Store(StoreError::Corrupt("bad row".into())));
        assert_eq!(internal.message(), "ctx");
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
