//! Storage seam between the services and the backing database.
//!
//! Both backends speak the same filter documents (see [`crate::filter`]):
//! [`PgStore`] compiles them to SQL, [`MemoryStore`] evaluates them in
//! process.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::database::DatabaseError;
use crate::filter::{FilterData, FilterError};
use crate::models::{Admin, Category, Product};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for {0}")]
    Duplicate(&'static str),

    #[error("stored record could not be decoded: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(DatabaseError::Sqlx(err))
    }
}

/// Outcome of an atomic stock change
#[derive(Debug, Clone, PartialEq)]
pub enum StockAdjustment {
    Adjusted(Product),
    /// Applying the delta would leave stock negative; nothing was written
    Insufficient { stock: i32 },
    NotFound,
}

/// One row of the per-category inventory report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: Category,
    pub count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_price: Decimal,
    pub total_stock: i64,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find(&self, filter: FilterData) -> Result<Vec<Product>, StoreError>;

    async fn count(&self, where_clause: Value) -> Result<i64, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    async fn insert(&self, product: &Product) -> Result<(), StoreError>;

    /// Overwrites the stored record; `false` when it no longer exists
    async fn replace(&self, product: &Product) -> Result<bool, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    /// Adds `delta` to stock in one conditional write
    async fn adjust_stock(&self, id: Uuid, delta: i32, at: DateTime<Utc>) -> Result<StockAdjustment, StoreError>;

    /// Groups matching products by category, ordered by category name
    async fn category_stats(&self, where_clause: Value) -> Result<Vec<CategoryStats>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find(&self, filter: FilterData) -> Result<Vec<Admin>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Admin>, StoreError>;

    /// `email` must already be normalized to lower case
    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the email is taken
    async fn insert(&self, admin: &Admin) -> Result<(), StoreError>;

    async fn replace(&self, admin: &Admin) -> Result<bool, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<Option<Admin>, StoreError>;

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Admin>, StoreError>;
}
