// handlers/system.rs - service description and health

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Rio Mobile API",
            "version": version,
            "description": "Product catalog and admin directory backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "products": "/api/products[/:id] (list/get public, writes gated)",
                "category": "/api/products/category/:category (public)",
                "stats": "/api/products/stats/overview (view_products)",
                "stock": "/api/products/:id/stock (edit_products)",
                "admins": "/api/admins[/:id] (view/add/edit/delete_admins)",
                "auth": "/api/auth/login, /api/auth/whoami",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    state.store_health().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::service_unavailable("database unavailable")
    })?;

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "database": "ok"
    })))
}
