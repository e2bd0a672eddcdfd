// handlers/auth.rs - token issue and introspection

use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::generate_jwt;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Caller, JsonBody};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/login
///
/// ```json
/// { "success": true, "data": { "token": "eyJ...", "admin": { ... }, "expiresIn": 86400 } }
/// ```
pub async fn login(State(state): State<AppState>, JsonBody(body): JsonBody<LoginRequest>) -> ApiResult<Value> {
    let admin = state
        .admins
        .authenticate(body.email.as_deref(), body.password.as_deref())
        .await
        .map_err(ApiError::context("Server error during login"))?;

    let issued = generate_jwt(&admin, &state.config.security).map_err(|e| {
        tracing::error!("Token generation failed: {}", e);
        ApiError::internal("Server error during login", e)
    })?;

    Ok(ApiResponse::success(json!({
        "token": issued.token,
        "admin": admin.view(),
        "expiresIn": issued.expires_in,
    })))
}

/// GET /api/auth/whoami - verified claims of the bearer token
pub async fn whoami(caller: Caller) -> ApiResult<Value> {
    let claims = caller.authenticated()?;
    Ok(ApiResponse::success(json!({
        "id": claims.sub,
        "email": claims.email,
        "role": claims.role,
        "permissions": claims.permissions,
        "expiresAt": claims.exp,
    })))
}
