use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;

use crate::app::AppState;
use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;
use crate::models::Permission;

/// Identity of the caller as established by the bearer token, if any.
/// Extraction never fails; handlers decide what they require.
#[derive(Debug, Clone)]
pub struct Caller {
    identity: Identity,
    enforce: bool,
}

#[derive(Debug, Clone)]
enum Identity {
    Anonymous,
    Verified(Claims),
    Rejected(String),
}

impl Caller {
    /// Verified claims or 401, regardless of enforcement
    pub fn authenticated(&self) -> Result<&Claims, ApiError> {
        match &self.identity {
            Identity::Verified(claims) => Ok(claims),
            Identity::Anonymous => Err(ApiError::unauthorized("Authentication required")),
            Identity::Rejected(msg) => Err(ApiError::unauthorized(msg.clone())),
        }
    }

    /// Gate for one operation. With enforcement off every caller passes.
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if !self.enforce {
            return Ok(());
        }
        let claims = self.authenticated()?;
        if claims.allows(permission) {
            Ok(())
        } else {
            tracing::warn!("Admin {} lacks permission {}", claims.sub, permission);
            Err(ApiError::forbidden(format!("Permission '{}' required", permission)))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let security = &state.config.security;
        let identity = match extract_jwt_from_headers(&parts.headers) {
            Ok(None) => Identity::Anonymous,
            Ok(Some(token)) => match validate_jwt(&token, security) {
                Ok(claims) => Identity::Verified(claims),
                Err(e) => Identity::Rejected(e.to_string()),
            },
            Err(msg) => Identity::Rejected(msg),
        };
        Ok(Caller { identity, enforce: security.enforce_permissions })
    }
}

/// Extract JWT token from Authorization header; `None` when absent
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, String> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header.to_str().map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if token.trim().is_empty() => Err("Empty JWT token".to_string()),
        Some(token) => Ok(Some(token.trim().to_string())),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}

/// `Json<T>` whose rejection is rendered as the error envelope
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parses_bearer_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_jwt_from_headers(&headers), Ok(None));

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_jwt_from_headers(&headers), Ok(Some("abc.def".to_string())));

        headers.insert("authorization", HeaderValue::from_static("Basic Zm9v"));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert!(extract_jwt_from_headers(&headers).is_err());
    }

    #[test]
    fn enforcement_off_allows_anonymous() {
        let caller = Caller { identity: Identity::Anonymous, enforce: false };
        assert!(caller.require(Permission::DeleteAdmins).is_ok());
        assert!(caller.authenticated().is_err());

        let caller = Caller { identity: Identity::Anonymous, enforce: true };
        assert!(matches!(caller.require(Permission::ViewAdmins), Err(ApiError::Unauthorized(_))));
    }
}
