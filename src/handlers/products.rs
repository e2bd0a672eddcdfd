// handlers/products.rs - /api/products catalog endpoints

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Caller, JsonBody};
use crate::models::{Permission, Product, ProductInput, ProductResponse};
use crate::services::ListParams;

fn responses(products: &[Product]) -> Vec<ProductResponse<'_>> {
    products.iter().map(Product::response).collect()
}

/// GET /api/products - filtered, paginated listing
///
/// Query: `category`, `brand`, `status`, `search`, `limit` (default 10),
/// `page` (default 1). Responds with `{ success, data, pagination }`.
pub async fn list(State(state): State<AppState>, query: Result<Query<ListParams>, QueryRejection>) -> ApiResult<Value> {
    let Query(params) = query?;
    let page = state
        .catalog
        .list(&params)
        .await
        .map_err(ApiError::context("Server error while fetching products"))?;

    Ok(ApiResponse::success(json!(responses(&page.items))).with("pagination", page.pagination))
}

/// GET /api/products/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let product = state.catalog.get(&id).await.map_err(ApiError::context("Server error while fetching product"))?;
    Ok(ApiResponse::success(json!(product.response())))
}

/// POST /api/products
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(input): JsonBody<ProductInput>,
) -> ApiResult<Value> {
    caller.require(Permission::AddProducts)?;
    let product = state.catalog.create(input).await.map_err(ApiError::context("Server error while creating product"))?;

    Ok(ApiResponse::created(json!(product.response())).message("Product created successfully"))
}

/// PUT /api/products/:id - partial update, re-validated as a whole
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ProductInput>,
) -> ApiResult<Value> {
    caller.require(Permission::EditProducts)?;
    let product =
        state.catalog.update(&id, input).await.map_err(ApiError::context("Server error while updating product"))?;

    Ok(ApiResponse::success(json!(product.response())).message("Product updated successfully"))
}

/// DELETE /api/products/:id
pub async fn delete(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<()> {
    caller.require(Permission::DeleteProducts)?;
    state.catalog.delete(&id).await.map_err(ApiError::context("Server error while deleting product"))?;

    Ok(ApiResponse::message_only("Product deleted successfully"))
}

/// GET /api/products/category/:category - active products only
pub async fn by_category(State(state): State<AppState>, Path(category): Path<String>) -> ApiResult<Value> {
    let products = state
        .catalog
        .list_by_category(&category)
        .await
        .map_err(ApiError::context("Server error while fetching products by category"))?;

    Ok(ApiResponse::success(json!(responses(&products))).with("count", products.len()))
}

/// GET /api/products/stats/overview
pub async fn stats_overview(State(state): State<AppState>, caller: Caller) -> ApiResult<Value> {
    caller.require(Permission::ViewProducts)?;
    let stats = state
        .catalog
        .stats_overview()
        .await
        .map_err(ApiError::context("Server error while fetching product statistics"))?;

    Ok(ApiResponse::success(json!({
        "categoryStats": &stats.category_stats,
        "lowStockProducts": responses(&stats.low_stock_products),
        "totalProducts": stats.total_products,
        "lowStockCount": stats.low_stock_count(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub delta: Option<Value>,
}

/// POST /api/products/:id/stock - `{ "delta": -1 }`
pub async fn adjust_stock(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StockRequest>,
) -> ApiResult<Value> {
    caller.require(Permission::EditProducts)?;
    let delta = body
        .delta
        .as_ref()
        .and_then(|d| d.as_i64().or_else(|| d.as_str().and_then(|s| s.trim().parse().ok())))
        .ok_or_else(|| ApiError::validation("Validation error", vec!["delta must be an integer".to_string()]))?;

    let product = state
        .catalog
        .adjust_stock(&id, delta)
        .await
        .map_err(ApiError::context("Server error while updating stock"))?;

    Ok(ApiResponse::success(json!(product.response())).message("Stock updated successfully"))
}
