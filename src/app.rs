use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers::{admins, auth, products, system};
use crate::services::{AdminService, CatalogService};
use crate::store::{AdminStore, MemoryStore, ProductStore, StoreError};

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub admins: Arc<AdminService>,
    pub config: Arc<AppConfig>,
    products: Arc<dyn ProductStore>,
}

impl AppState {
    pub fn new(products: Arc<dyn ProductStore>, admins: Arc<dyn AdminStore>, config: AppConfig) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(products.clone(), config.catalog.max_limit)),
            admins: Arc::new(AdminService::new(admins, config.security.bcrypt_cost)),
            config: Arc::new(config),
            products,
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store, config)
    }

    pub async fn store_health(&self) -> Result<(), StoreError> {
        self.products.ping().await
    }
}

pub fn router(state: AppState) -> Router {
    let api = &state.config.api;

    let router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(product_routes())
        .merge(admin_routes())
        .merge(auth_routes())
        .fallback(not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes))
        .layer(cors_layer(&state.config.security.cors_origins));

    let router = if api.enable_request_logging { router.layer(TraceLayer::new_for_http()) } else { router };
    router.with_state(state)
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(products::list).post(products::create))
        .route("/api/products/stats/overview", get(products::stats_overview))
        .route("/api/products/category/:category", get(products::by_category))
        .route("/api/products/:id", get(products::get).put(products::update).delete(products::delete))
        .route("/api/products/:id/stock", post(products::adjust_stock))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admins", get(admins::list).post(admins::create))
        .route("/api/admins/:id", get(admins::get).put(admins::update).delete(admins::delete))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/whoami", get(auth::whoami))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// `*` means any origin; otherwise an explicit allow-list
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new().allow_origin(allowed).allow_methods(Any).allow_headers(Any)
}
