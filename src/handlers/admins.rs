// handlers/admins.rs - /api/admins directory endpoints
//
// Every payload goes through `AdminView`, so the credential hash never
// leaves the service.

use axum::extract::{Path, State};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Caller, JsonBody};
use crate::models::{AdminInput, AdminView, Permission};

/// GET /api/admins
pub async fn list(State(state): State<AppState>, caller: Caller) -> ApiResult<Vec<AdminView>> {
    caller.require(Permission::ViewAdmins)?;
    let admins = state.admins.list().await.map_err(ApiError::context("Failed to fetch admins"))?;
    let count = admins.len();

    Ok(ApiResponse::success(admins.iter().map(|a| a.view()).collect()).with("count", count))
}

/// GET /api/admins/:id
pub async fn get(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<AdminView> {
    caller.require(Permission::ViewAdmins)?;
    let admin = state.admins.get(&id).await.map_err(ApiError::context("Failed to fetch admin"))?;

    Ok(ApiResponse::success(admin.view()))
}

/// POST /api/admins
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(input): JsonBody<AdminInput>,
) -> ApiResult<AdminView> {
    caller.require(Permission::AddAdmins)?;
    let admin = state.admins.create(input).await.map_err(ApiError::context("Failed to create admin"))?;

    Ok(ApiResponse::created(admin.view()).message("Admin created successfully"))
}

/// PUT /api/admins/:id
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<AdminInput>,
) -> ApiResult<AdminView> {
    caller.require(Permission::EditAdmins)?;
    let admin = state.admins.update(&id, input).await.map_err(ApiError::context("Failed to update admin"))?;

    Ok(ApiResponse::success(admin.view()).message("Admin updated successfully"))
}

/// DELETE /api/admins/:id
pub async fn delete(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<AdminView> {
    caller.require(Permission::DeleteAdmins)?;
    let admin = state.admins.delete(&id).await.map_err(ApiError::context("Failed to delete admin"))?;

    Ok(ApiResponse::success(admin.view()).message("Admin deleted successfully"))
}
