use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

use super::{AdminStore, CategoryStats, ProductStore, StockAdjustment, StoreError};
use crate::database::query_builder::bind_param_query_as;
use crate::database::{DatabaseManager, Repository};
use crate::filter::{Filter, FilterData};
use crate::models::{Admin, AdminRow, Product, ProductRow};

const PRODUCTS: &str = "products";
const ADMINS: &str = "admins";

/// Postgres-backed implementation of both catalog and admin storage
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct CategoryStatsRow {
    category: String,
    count: i64,
    total_value: Option<Decimal>,
    avg_price: Option<Decimal>,
    total_stock: Option<i64>,
}

impl PgStore {
    pub fn new(database: &DatabaseManager) -> Self {
        Self { pool: database.pool().clone() }
    }

    fn products(&self) -> Repository<ProductRow> {
        Repository::new(PRODUCTS, self.pool.clone())
    }

    fn admins(&self) -> Repository<AdminRow> {
        Repository::new(ADMINS, self.pool.clone())
    }
}

fn product_from_row(row: ProductRow) -> Result<Product, StoreError> {
    Product::try_from(row).map_err(StoreError::Corrupt)
}

fn admin_from_row(row: AdminRow) -> Result<Admin, StoreError> {
    Admin::try_from(row).map_err(StoreError::Corrupt)
}

fn unique_violation(err: sqlx::Error, field: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate(field),
        _ => err.into(),
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn find(&self, filter: FilterData) -> Result<Vec<Product>, StoreError> {
        self.products().select_any(filter).await?.into_iter().map(product_from_row).collect()
    }

    async fn count(&self, where_clause: Value) -> Result<i64, StoreError> {
        Ok(self.products().count(where_clause).await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(product_from_row).transpose()
    }

    async fn insert(&self, product: &Product) -> Result<(), StoreError> {
        let row = ProductRow::from(product);
        sqlx::query(
            "INSERT INTO products (id, name, category, brand, ram, storage, color, price, description, image,
                                   stock, status, specifications, features, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(row.id)
        .bind(row.name)
        .bind(row.category)
        .bind(row.brand)
        .bind(row.ram)
        .bind(row.storage)
        .bind(row.color)
        .bind(row.price)
        .bind(row.description)
        .bind(row.image)
        .bind(row.stock)
        .bind(row.status)
        .bind(row.specifications)
        .bind(row.features)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace(&self, product: &Product) -> Result<bool, StoreError> {
        let row = ProductRow::from(product);
        let result = sqlx::query(
            "UPDATE products
             SET name = $2, category = $3, brand = $4, ram = $5, storage = $6, color = $7, price = $8,
                 description = $9, image = $10, stock = $11, status = $12, specifications = $13,
                 features = $14, updated_at = $15
             WHERE id = $1",
        )
        .bind(row.id)
        .bind(row.name)
        .bind(row.category)
        .bind(row.brand)
        .bind(row.ram)
        .bind(row.storage)
        .bind(row.color)
        .bind(row.price)
        .bind(row.description)
        .bind(row.image)
        .bind(row.stock)
        .bind(row.status)
        .bind(row.specifications)
        .bind(row.features)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>("DELETE FROM products WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(product_from_row).transpose()
    }

    async fn adjust_stock(&self, id: Uuid, delta: i32, at: DateTime<Utc>) -> Result<StockAdjustment, StoreError> {
        let updated = sqlx::query_as::<_, ProductRow>(
            "UPDATE products SET stock = stock + $2, updated_at = $3
             WHERE id = $1 AND stock + $2 >= 0
             RETURNING *",
        )
        .bind(id)
        .bind(delta)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            return Ok(StockAdjustment::Adjusted(product_from_row(row)?));
        }

        // The guarded update matched nothing: either the product is gone or
        // the delta was too large. Only the report depends on this read.
        let current: Option<(i32,)> = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match current {
            Some((stock,)) => StockAdjustment::Insufficient { stock },
            None => StockAdjustment::NotFound,
        })
    }

    async fn category_stats(&self, where_clause: Value) -> Result<Vec<CategoryStats>, StoreError> {
        let mut filter = Filter::new(PRODUCTS)?;
        filter.where_clause(where_clause)?;
        let predicate = filter.to_where_sql()?;

        let query = format!(
            "SELECT category, COUNT(*) AS count, SUM(price * stock) AS total_value,
                    ROUND(AVG(price), 2) AS avg_price, SUM(stock)::BIGINT AS total_stock
             FROM products WHERE {} GROUP BY category ORDER BY category",
            predicate.query
        );
        let mut q = sqlx::query_as::<_, CategoryStatsRow>(&query);
        for p in predicate.params.iter() {
            q = bind_param_query_as(q, p);
        }

        let mut stats = Vec::new();
        for row in q.fetch_all(&self.pool).await? {
            let category = match row.category.parse() {
                Ok(category) => category,
                Err(e) => {
                    warn!("Skipping stats for unknown category: {}", e);
                    continue;
                }
            };
            stats.push(CategoryStats {
                category,
                count: row.count,
                total_value: row.total_value.unwrap_or_default(),
                avg_price: row.avg_price.unwrap_or_default(),
                total_stock: row.total_stock.unwrap_or_default(),
            });
        }
        Ok(stats)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AdminStore for PgStore {
    async fn find(&self, filter: FilterData) -> Result<Vec<Admin>, StoreError> {
        self.admins().select_any(filter).await?.into_iter().map(admin_from_row).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Admin>, StoreError> {
        let row = sqlx::query_as::<_, AdminRow>("SELECT * FROM admins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(admin_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        let row = self.admins().select_one(FilterData::matching(serde_json::json!({ "email": email }))).await?;
        row.map(admin_from_row).transpose()
    }

    async fn insert(&self, admin: &Admin) -> Result<(), StoreError> {
        let row = AdminRow::from(admin);
        sqlx::query(
            "INSERT INTO admins (id, name, email, password, phone, role, status, department, permissions,
                                 last_login, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(row.id)
        .bind(row.name)
        .bind(row.email)
        .bind(row.password)
        .bind(row.phone)
        .bind(row.role)
        .bind(row.status)
        .bind(row.department)
        .bind(row.permissions)
        .bind(row.last_login)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "email"))?;
        Ok(())
    }

    async fn replace(&self, admin: &Admin) -> Result<bool, StoreError> {
        let row = AdminRow::from(admin);
        let result = sqlx::query(
            "UPDATE admins
             SET name = $2, email = $3, password = $4, phone = $5, role = $6, status = $7,
                 department = $8, permissions = $9, last_login = $10, updated_at = $11
             WHERE id = $1",
        )
        .bind(row.id)
        .bind(row.name)
        .bind(row.email)
        .bind(row.password)
        .bind(row.phone)
        .bind(row.role)
        .bind(row.status)
        .bind(row.department)
        .bind(row.permissions)
        .bind(row.last_login)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "email"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Admin>, StoreError> {
        let row = sqlx::query_as::<_, AdminRow>("DELETE FROM admins WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(admin_from_row).transpose()
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Admin>, StoreError> {
        let row = sqlx::query_as::<_, AdminRow>("UPDATE admins SET last_login = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;
        row.map(admin_from_row).transpose()
    }
}
