use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::{invalid, ServiceError};
use crate::filter::{contains_pattern, FilterData};
use crate::models::{Category, Product, ProductInput, ProductStatus, LOW_STOCK_THRESHOLD};
use crate::store::{CategoryStats, ProductStore, StockAdjustment};

pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_PAGE: i64 = 1;

const PRODUCT_NOT_FOUND: &str = "Product not found";

/// Most recent first; id breaks ties between equal timestamps
fn newest_first() -> Value {
    json!(["created_at desc", "id desc"])
}

/// Raw list query string. Values stay strings so that non-numeric paging
/// falls back to defaults instead of failing extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
}

/// Validated list request
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub where_clause: Value,
    pub page: i64,
    pub limit: i64,
}

impl ListQuery {
    pub fn skip(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

fn supplied(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().filter(|s| !s.trim().is_empty())
}

/// Leading-integer parse: `"3"`, `"3.7"` → 3; anything else is `None`.
fn parse_count(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>().ok().filter(|f| f.is_finite() && f.abs() < i64::MAX as f64).map(|f| f.trunc() as i64)
    })
}

fn paging_value(raw: &Option<String>, name: &str, default: i64) -> Result<i64, ServiceError> {
    match supplied(raw).and_then(parse_count) {
        None => Ok(default),
        Some(n) if n < 1 => Err(invalid(format!("{} must be a positive integer", name))),
        Some(n) => Ok(n),
    }
}

impl ListParams {
    pub fn to_query(&self, max_limit: Option<i64>) -> Result<ListQuery, ServiceError> {
        let page = paging_value(&self.page, "page", DEFAULT_PAGE)?;
        let mut limit = paging_value(&self.limit, "limit", DEFAULT_LIMIT)?;
        if let Some(max) = max_limit.filter(|max| limit > *max) {
            warn!("Limit {} exceeds max {}, capping to max", limit, max);
            limit = max;
        }
        if (page - 1).checked_mul(limit).is_none() {
            return Err(invalid("page is out of range"));
        }

        let mut clauses = Vec::new();
        if let Some(category) = supplied(&self.category) {
            let category: Category = category.trim().parse().map_err(invalid)?;
            clauses.push(json!({ "category": category.as_str() }));
        }
        if let Some(brand) = supplied(&self.brand) {
            clauses.push(json!({ "brand": { "$ilike": contains_pattern(brand) } }));
        }
        if let Some(status) = supplied(&self.status) {
            let status: ProductStatus = status.trim().parse().map_err(invalid)?;
            clauses.push(json!({ "status": status.as_str() }));
        }
        if let Some(search) = supplied(&self.search) {
            let pattern = contains_pattern(search);
            clauses.push(json!({ "$or": [
                { "name": { "$ilike": pattern } },
                { "description": { "$ilike": pattern } },
                { "brand": { "$ilike": pattern } },
            ]}));
        }

        Ok(ListQuery { where_clause: json!({ "$and": clauses }), page, limit })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current: i64,
    pub pages: i64,
    pub total: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(current: i64, limit: i64, total: i64) -> Self {
        let pages = if total <= 0 { 0 } else { (total - 1) / limit + 1 };
        Self { current, pages, total, limit }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone)]
pub struct StatsOverview {
    pub category_stats: Vec<CategoryStats>,
    pub low_stock_products: Vec<Product>,
    pub total_products: i64,
}

impl StatsOverview {
    pub fn low_stock_count(&self) -> usize {
        self.low_stock_products.len()
    }
}

pub(crate) fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Product catalog operations over a [`ProductStore`]
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
    max_limit: Option<i64>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductStore>, max_limit: Option<i64>) -> Self {
        Self { products, max_limit }
    }

    pub async fn list(&self, params: &ListParams) -> Result<Page<Product>, ServiceError> {
        let query = params.to_query(self.max_limit)?;
        let filter = FilterData::matching(query.where_clause.clone())
            .ordered(newest_first())
            .page(query.limit, query.skip());

        let (items, total) =
            futures::try_join!(self.products.find(filter), self.products.count(query.where_clause.clone()))?;

        Ok(Page { items, pagination: Pagination::new(query.page, query.limit, total) })
    }

    pub async fn get(&self, id: &str) -> Result<Product, ServiceError> {
        let Some(id) = parse_id(id) else {
            return Err(ServiceError::NotFound(PRODUCT_NOT_FOUND));
        };
        self.products.get(id).await?.ok_or(ServiceError::NotFound(PRODUCT_NOT_FOUND))
    }

    pub async fn create(&self, input: ProductInput) -> Result<Product, ServiceError> {
        let product = input.into_new_product(Utc::now())?;
        self.products.insert(&product).await?;

        info!(
            "Product created: id={} name={} category={} price={}",
            product.id,
            product.name,
            product.category(),
            product.formatted_price()
        );
        Ok(product)
    }

    pub async fn update(&self, id: &str, input: ProductInput) -> Result<Product, ServiceError> {
        let existing = self.get(id).await?;
        let updated = input.apply_to(&existing, Utc::now())?;
        if !self.products.replace(&updated).await? {
            return Err(ServiceError::NotFound(PRODUCT_NOT_FOUND));
        }

        info!("Product updated: id={} name={}", updated.id, updated.name);
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<Product, ServiceError> {
        let Some(id) = parse_id(id) else {
            return Err(ServiceError::NotFound(PRODUCT_NOT_FOUND));
        };
        let deleted = self.products.delete(id).await?.ok_or(ServiceError::NotFound(PRODUCT_NOT_FOUND))?;

        info!("Product deleted: id={} name={}", deleted.id, deleted.name);
        Ok(deleted)
    }

    /// Active products of one category, newest first, unpaginated
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, ServiceError> {
        let category: Category = category.trim().parse().map_err(invalid)?;
        let filter = FilterData::matching(json!({ "category": category.as_str(), "status": ProductStatus::Active.as_str() }))
            .ordered(newest_first());
        Ok(self.products.find(filter).await?)
    }

    /// Per-category inventory totals plus the low-stock report. The three
    /// reads are issued together; all of them only consider active products.
    pub async fn stats_overview(&self) -> Result<StatsOverview, ServiceError> {
        let active = json!({ "status": ProductStatus::Active.as_str() });
        let low_stock = FilterData::matching(json!({
            "stock": { "$lte": LOW_STOCK_THRESHOLD },
            "status": ProductStatus::Active.as_str(),
        }))
        .ordered(json!(["stock asc", "name asc"]));

        let (category_stats, low_stock_products, total_products) = futures::try_join!(
            self.products.category_stats(active.clone()),
            self.products.find(low_stock),
            self.products.count(active),
        )?;

        Ok(StatsOverview { category_stats, low_stock_products, total_products })
    }

    /// Applies a signed stock delta atomically; stock never goes negative.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> Result<Product, ServiceError> {
        let Some(id) = parse_id(id) else {
            return Err(ServiceError::NotFound(PRODUCT_NOT_FOUND));
        };
        let delta = i32::try_from(delta).map_err(|_| invalid("delta is out of range"))?;

        match self.products.adjust_stock(id, delta, Utc::now()).await? {
            StockAdjustment::Adjusted(product) => {
                info!("Stock adjusted: id={} delta={} stock={}", product.id, delta, product.stock);
                Ok(product)
            }
            StockAdjustment::Insufficient { stock } => {
                warn!("Rejected stock adjustment: id={} delta={} stock={}", id, delta, stock);
                Err(invalid(format!("Insufficient stock: {} available, cannot apply {}", stock, delta)))
            }
            StockAdjustment::NotFound => Err(ServiceError::NotFound(PRODUCT_NOT_FOUND)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let mut p = ListParams::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "category" => p.category = v,
                "brand" => p.brand = v,
                "status" => p.status = v,
                "search" => p.search = v,
                "limit" => p.limit = v,
                "page" => p.page = v,
                _ => unreachable!(),
            }
        }
        p
    }

    #[test]
    fn defaults_and_non_numeric_paging() {
        let q = params(&[]).to_query(None).unwrap();
        assert_eq!((q.page, q.limit, q.skip()), (1, 10, 0));

        let q = params(&[("page", "abc"), ("limit", "x")]).to_query(None).unwrap();
        assert_eq!((q.page, q.limit), (1, 10));

        let q = params(&[("page", "3"), ("limit", "5")]).to_query(None).unwrap();
        assert_eq!(q.skip(), 10);
    }

    #[test]
    fn rejects_non_positive_paging_and_caps_limit() {
        assert!(params(&[("page", "0")]).to_query(None).is_err());
        assert!(params(&[("limit", "-4")]).to_query(None).is_err());

        let q = params(&[("limit", "5000")]).to_query(Some(100)).unwrap();
        assert_eq!(q.limit, 100);
    }

    #[test]
    fn builds_conjunction_of_filters() {
        let q = params(&[("category", "accessories"), ("brand", "jb"), ("search", "50%")]).to_query(None).unwrap();
        assert_eq!(
            q.where_clause,
            json!({ "$and": [
                { "category": "accessories" },
                { "brand": { "$ilike": "%jb%" } },
                { "$or": [
                    { "name": { "$ilike": "%50\\%%" } },
                    { "description": { "$ilike": "%50\\%%" } },
                    { "brand": { "$ilike": "%50\\%%" } },
                ]},
            ]})
        );
    }

    #[test]
    fn rejects_unknown_enumerations() {
        assert!(matches!(params(&[("category", "laptop")]).to_query(None), Err(ServiceError::Invalid(_))));
        assert!(matches!(params(&[("status", "archived")]).to_query(None), Err(ServiceError::Invalid(_))));
    }

    #[test]
    fn pagination_math() {
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).pages, 1);
        assert_eq!(Pagination::new(2, 10, 11).pages, 2);
        assert_eq!(Pagination::new(1, 3, 7).pages, 3);
        assert_eq!(Pagination::new(1, i64::MAX, 1).pages, 1);
        assert_eq!(Pagination::new(1, i64::MAX, i64::MAX).pages, 1);
    }

    #[tokio::test]
    async fn uncapped_maximum_limit_lists_a_single_page() {
        let catalog = CatalogService::new(Arc::new(crate::store::MemoryStore::new()), None);
        let input: ProductInput = serde_json::from_value(json!({
            "name": "Charger", "category": "accessories", "color": "White", "price": 2500, "stock": 4
        }))
        .unwrap();
        catalog.create(input).await.unwrap();

        let page = catalog.list(&params(&[("limit", "9223372036854775807")])).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pagination, Pagination { current: 1, pages: 1, total: 1, limit: i64::MAX });
    }
}
