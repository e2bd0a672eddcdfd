use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AdminStore, CategoryStats, ProductStore, StockAdjustment, StoreError};
use crate::filter::filter_order::FilterOrder;
use crate::filter::{Filter, FilterData, FilterMatch};
use crate::models::{Admin, AdminRow, Product, ProductRow};

/// Process-local store evaluating filter documents directly against rows.
/// Used for `serve --in-memory` and by the integration tests.
#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<BTreeMap<Uuid, Product>>,
    admins: RwLock<BTreeMap<Uuid, Admin>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Serializes a record through its row type so filters see the same column
/// names and value shapes as the SQL backend.
fn document<R: Serialize>(row: R) -> Result<Value, StoreError> {
    serde_json::to_value(row).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Applies where, order, offset and limit the way the generated SELECT does.
fn select<'a, T, R>(records: impl Iterator<Item = &'a T>, filter_data: FilterData) -> Result<Vec<T>, StoreError>
where
    T: Clone + 'a,
    R: Serialize + From<&'a T>,
{
    let mut filter = Filter::new("memory")?;
    filter.assign(filter_data)?;

    let mut matched = Vec::new();
    for record in records {
        let doc = document(R::from(record))?;
        if FilterMatch::matches(filter.where_data().unwrap_or(&Value::Null), &doc)? {
            matched.push((doc, record));
        }
    }
    matched.sort_by(|(a, _), (b, _)| FilterOrder::compare(filter.order_data(), a, b));

    let offset = usize::try_from(filter.offset_value().unwrap_or(0)).unwrap_or(usize::MAX);
    let limit = filter
        .limit_value()
        .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
        .unwrap_or(usize::MAX);
    Ok(matched.into_iter().skip(offset).take(limit).map(|(_, record)| record.clone()).collect())
}

fn count_matching<'a, T, R>(records: impl Iterator<Item = &'a T>, where_clause: &Value) -> Result<i64, StoreError>
where
    T: 'a,
    R: Serialize + From<&'a T>,
{
    let mut count = 0;
    for record in records {
        if FilterMatch::matches(where_clause, &document(R::from(record))?)? {
            count += 1;
        }
    }
    Ok(count)
}

#[derive(Default)]
struct CategoryTotals {
    count: i64,
    total_value: Decimal,
    price_sum: Decimal,
    total_stock: i64,
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn find(&self, filter: FilterData) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().await;
        select::<Product, ProductRow>(products.values(), filter)
    }

    async fn count(&self, where_clause: Value) -> Result<i64, StoreError> {
        let products = self.products.read().await;
        count_matching::<Product, ProductRow>(products.values(), &where_clause)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn insert(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id) {
            return Err(StoreError::Duplicate("id"));
        }
        products.insert(product.id, product.clone());
        Ok(())
    }

    async fn replace(&self, product: &Product) -> Result<bool, StoreError> {
        let mut products = self.products.write().await;
        match products.get_mut(&product.id) {
            Some(slot) => {
                *slot = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.products.write().await.remove(&id))
    }

    async fn adjust_stock(&self, id: Uuid, delta: i32, at: DateTime<Utc>) -> Result<StockAdjustment, StoreError> {
        // Read and write happen under one write guard
        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(&id) else {
            return Ok(StockAdjustment::NotFound);
        };
        match product.stock.checked_add(delta) {
            Some(stock) if stock >= 0 => {
                product.stock = stock;
                product.updated_at = at;
                Ok(StockAdjustment::Adjusted(product.clone()))
            }
            _ => Ok(StockAdjustment::Insufficient { stock: product.stock }),
        }
    }

    async fn category_stats(&self, where_clause: Value) -> Result<Vec<CategoryStats>, StoreError> {
        let products = self.products.read().await;

        // Keyed by the wire name so ordering matches ORDER BY category
        let mut groups: BTreeMap<&'static str, (crate::models::Category, CategoryTotals)> = BTreeMap::new();
        for product in products.values() {
            if !FilterMatch::matches(&where_clause, &document(ProductRow::from(product))?)? {
                continue;
            }
            let category = product.category();
            let (_, totals) = groups.entry(category.as_str()).or_insert_with(|| (category, CategoryTotals::default()));
            totals.count += 1;
            totals.total_value += product.price * Decimal::from(product.stock);
            totals.price_sum += product.price;
            totals.total_stock += i64::from(product.stock);
        }

        Ok(groups
            .into_values()
            .map(|(category, totals)| CategoryStats {
                category,
                count: totals.count,
                total_value: totals.total_value,
                avg_price: (totals.price_sum / Decimal::from(totals.count)).round_dp(2),
                total_stock: totals.total_stock,
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn find(&self, filter: FilterData) -> Result<Vec<Admin>, StoreError> {
        let admins = self.admins.read().await;
        select::<Admin, AdminRow>(admins.values(), filter)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Admin>, StoreError> {
        Ok(self.admins.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        Ok(self.admins.read().await.values().find(|a| a.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn insert(&self, admin: &Admin) -> Result<(), StoreError> {
        let mut admins = self.admins.write().await;
        if admins.values().any(|a| a.email.eq_ignore_ascii_case(&admin.email)) {
            return Err(StoreError::Duplicate("email"));
        }
        admins.insert(admin.id, admin.clone());
        Ok(())
    }

    async fn replace(&self, admin: &Admin) -> Result<bool, StoreError> {
        let mut admins = self.admins.write().await;
        if admins.values().any(|a| a.id != admin.id && a.email.eq_ignore_ascii_case(&admin.email)) {
            return Err(StoreError::Duplicate("email"));
        }
        match admins.get_mut(&admin.id) {
            Some(slot) => {
                *slot = admin.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Admin>, StoreError> {
        Ok(self.admins.write().await.remove(&id))
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Admin>, StoreError> {
        let mut admins = self.admins.write().await;
        Ok(admins.get_mut(&id).map(|admin| {
            admin.last_login = Some(at);
            admin.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductInput;
    use chrono::Duration;
    use serde_json::json;
    use std::str::FromStr;

    fn product(body: Value, created_at: DateTime<Utc>) -> Product {
        serde_json::from_value::<ProductInput>(body).unwrap().into_new_product(created_at).unwrap()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        let items = [
            json!({ "name": "Galaxy S24", "category": "mobile_phone", "brand": "Samsung", "color": "Black",
                    "price": 120000, "ram": "8GB", "storage": "256GB", "stock": 4 }),
            json!({ "name": "USB-C Cable", "category": "accessories", "color": "White", "price": 800, "stock": 40 }),
            json!({ "name": "Flip 6", "category": "bluetooth_speaker", "brand": "JBL", "color": "Blue",
                    "price": 15000, "stock": 12 }),
            json!({ "name": "Charger", "category": "accessories", "color": "White", "price": 2500, "stock": 2 }),
        ];
        for (i, body) in items.into_iter().enumerate() {
            let p = product(body, t0 + Duration::seconds(i as i64));
            ProductStore::insert(&store, &p).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn find_filters_orders_and_pages() {
        let store = seeded().await;
        let all = ProductStore::find(&store, FilterData::default().ordered(json!(["created_at desc", "id desc"])))
            .await
            .unwrap();
        assert_eq!(all.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), ["Charger", "Flip 6", "USB-C Cable", "Galaxy S24"]);

        let page = ProductStore::find(
            &store,
            FilterData::matching(json!({ "category": "accessories" })).ordered("created_at desc").page(1, 1),
        )
        .await
        .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "USB-C Cable");

        assert_eq!(ProductStore::count(&store, json!({ "stock": { "$lte": 10 } })).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn stock_adjustment_is_conditional() {
        let store = seeded().await;
        let charger = ProductStore::find(&store, FilterData::matching(json!({ "name": "Charger" })))
            .await
            .unwrap()
            .remove(0);

        let outcome = store.adjust_stock(charger.id, -3, Utc::now()).await.unwrap();
        assert_eq!(outcome, StockAdjustment::Insufficient { stock: 2 });

        match store.adjust_stock(charger.id, 5, Utc::now()).await.unwrap() {
            StockAdjustment::Adjusted(p) => assert_eq!(p.stock, 7),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(store.adjust_stock(Uuid::new_v4(), 1, Utc::now()).await.unwrap(), StockAdjustment::NotFound);
    }

    #[tokio::test]
    async fn category_stats_group_by_name() {
        let store = seeded().await;
        let stats = store.category_stats(json!({ "status": "active" })).await.unwrap();
        let names: Vec<_> = stats.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, ["accessories", "bluetooth_speaker", "mobile_phone"]);

        let accessories = &stats[0];
        assert_eq!(accessories.count, 2);
        assert_eq!(accessories.total_stock, 42);
        assert_eq!(accessories.total_value, Decimal::from(800 * 40 + 2500 * 2));
        assert_eq!(accessories.avg_price, Decimal::from_str("1650").unwrap());
    }
}
