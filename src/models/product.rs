use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use super::{trimmed, Invalid};

/// Stock at or below this many units counts as low stock
pub const LOW_STOCK_THRESHOLD: i32 = 10;

closed_enum! {
    pub enum Category {
        MobilePhone => "mobile_phone",
        Accessories => "accessories",
        BluetoothSpeaker => "bluetooth_speaker",
        JblPartyBox => "jbl_party_box",
    }
}

closed_enum! {
    pub enum Ram {
        Gb4 => "4GB",
        Gb6 => "6GB",
        Gb8 => "8GB",
        Gb12 => "12GB",
        Gb16 => "16GB",
    }
}

closed_enum! {
    pub enum Storage {
        Gb64 => "64GB",
        Gb128 => "128GB",
        Gb256 => "256GB",
        Gb512 => "512GB",
        Tb1 => "1TB",
    }
}

closed_enum! {
    pub enum ProductStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

/// Category of a product together with the attributes only that category carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    MobilePhone { ram: Ram, storage: Storage },
    Accessories,
    BluetoothSpeaker,
    JblPartyBox,
}

impl ProductKind {
    pub fn category(&self) -> Category {
        match self {
            ProductKind::MobilePhone { .. } => Category::MobilePhone,
            ProductKind::Accessories => Category::Accessories,
            ProductKind::BluetoothSpeaker => Category::BluetoothSpeaker,
            ProductKind::JblPartyBox => Category::JblPartyBox,
        }
    }

    pub fn ram(&self) -> Option<Ram> {
        match self {
            ProductKind::MobilePhone { ram, .. } => Some(*ram),
            _ => None,
        }
    }

    pub fn storage(&self) -> Option<Storage> {
        match self {
            ProductKind::MobilePhone { storage, .. } => Some(*storage),
            _ => None,
        }
    }

    pub fn from_parts(category: Category, ram: Option<Ram>, storage: Option<Storage>) -> Result<Self, Invalid> {
        match category {
            Category::MobilePhone => match (ram, storage) {
                (Some(ram), Some(storage)) => Ok(ProductKind::MobilePhone { ram, storage }),
                (ram, storage) => {
                    let mut errors = Vec::new();
                    if ram.is_none() {
                        errors.push("ram is required for mobile_phone products".to_string());
                    }
                    if storage.is_none() {
                        errors.push("storage is required for mobile_phone products".to_string());
                    }
                    Err(Invalid::new("RAM and storage are required for mobile phones", errors))
                }
            },
            Category::Accessories | Category::BluetoothSpeaker | Category::JblPartyBox => {
                let mut errors = Vec::new();
                if ram.is_some() {
                    errors.push("ram is only valid for mobile_phone products".to_string());
                }
                if storage.is_some() {
                    errors.push("storage is only valid for mobile_phone products".to_string());
                }
                if !errors.is_empty() {
                    return Err(Invalid::fields(errors));
                }
                Ok(match category {
                    Category::Accessories => ProductKind::Accessories,
                    Category::BluetoothSpeaker => ProductKind::BluetoothSpeaker,
                    _ => ProductKind::JblPartyBox,
                })
            }
        }
    }
}

// Flattened into the product payload as `category` (+ `ram`/`storage` for phones)
impl Serialize for ProductKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("category", &self.category())?;
        if let ProductKind::MobilePhone { ram, storage } = self {
            map.serialize_entry("ram", ram)?;
            map.serialize_entry("storage", storage)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub kind: ProductKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub color: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub stock: i32,
    pub status: ProductStatus,
    pub specifications: BTreeMap<String, String>,
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= LOW_STOCK_THRESHOLD
    }

    pub fn formatted_price(&self) -> String {
        format_price(self.price)
    }

    /// Wire representation including the derived fields
    pub fn response(&self) -> ProductResponse<'_> {
        ProductResponse {
            product: self,
            formatted_price: self.formatted_price(),
            low_stock: self.is_low_stock(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse<'a> {
    #[serde(flatten)]
    pub product: &'a Product,
    pub formatted_price: String,
    pub low_stock: bool,
}

/// `Rs. 12,500` style display string: thousands separators, at most three
/// fraction digits, trailing zeros dropped.
pub fn format_price(price: Decimal) -> String {
    let text = price.round_dp(3).normalize().to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("Rs. {}{}.{}", sign, grouped, frac),
        None => format!("Rs. {}{}", sign, grouped),
    }
}

/// Request body for product create and update. Everything is optional and
/// loosely typed here; `into_new_product` and `apply_to` do the validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub color: Option<String>,
    pub price: Option<Value>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub stock: Option<Value>,
    pub status: Option<String>,
    pub specifications: Option<BTreeMap<String, String>>,
    pub features: Option<Vec<String>>,
}

impl ProductInput {
    /// Validates a create request. New products always start `active`.
    pub fn into_new_product(self, now: DateTime<Utc>) -> Result<Product, Invalid> {
        let name = trimmed(self.name.as_deref());
        let category = trimmed(self.category.as_deref());
        let color = trimmed(self.color.as_deref());
        let price = self.price.as_ref().filter(|v| is_supplied(v));

        let mut missing = Vec::new();
        if name.is_none() {
            missing.push("name is required".to_string());
        }
        if category.is_none() {
            missing.push("category is required".to_string());
        }
        if color.is_none() {
            missing.push("color is required".to_string());
        }
        if price.is_none() {
            missing.push("price is required".to_string());
        }
        let (Some(name), Some(category), Some(color), Some(price)) = (name, category, color, price) else {
            return Err(Invalid::new("Name, category, color, and price are required fields", missing));
        };

        let mut errors = Vec::new();
        let category = parse_into::<Category>(&category, &mut errors);
        let price = coerce_price(price).map_err(|e| errors.push(e)).ok();
        let ram = parse_optional::<Ram>(self.ram.as_deref(), &mut errors);
        let storage = parse_optional::<Storage>(self.storage.as_deref(), &mut errors);

        // Unparseable stock falls back to zero; negative stock is still an error
        let stock = match self.stock.as_ref().and_then(coerce_stock).unwrap_or(0) {
            s if s < 0 => {
                errors.push("stock cannot be negative".to_string());
                0
            }
            s => i32::try_from(s).unwrap_or_else(|_| {
                errors.push("stock is out of range".to_string());
                0
            }),
        };

        let (Some(category), Some(price), true) = (category, price, errors.is_empty()) else {
            return Err(Invalid::fields(errors));
        };
        let kind = ProductKind::from_parts(category, ram, storage)?;

        Ok(Product {
            id: Uuid::new_v4(),
            name,
            kind,
            brand: trimmed(self.brand.as_deref()),
            color,
            price,
            description: trimmed(self.description.as_deref()),
            image: trimmed(self.image.as_deref()),
            stock,
            status: ProductStatus::Active,
            specifications: self.specifications.unwrap_or_default(),
            features: clean_features(self.features.unwrap_or_default()),
            created_at: now,
            updated_at: now,
        })
    }

    /// Merges the supplied fields over `existing` and re-validates the result.
    pub fn apply_to(self, existing: &Product, now: DateTime<Utc>) -> Result<Product, Invalid> {
        let mut next = existing.clone();
        let mut errors = Vec::new();

        if let Some(name) = self.name.as_deref() {
            match trimmed(Some(name)) {
                Some(name) => next.name = name,
                None => errors.push("name cannot be empty".to_string()),
            }
        }
        if let Some(color) = self.color.as_deref() {
            match trimmed(Some(color)) {
                Some(color) => next.color = color,
                None => errors.push("color cannot be empty".to_string()),
            }
        }
        if let Some(brand) = self.brand.as_deref() {
            next.brand = trimmed(Some(brand));
        }
        if let Some(description) = self.description.as_deref() {
            next.description = trimmed(Some(description));
        }
        if let Some(image) = self.image.as_deref() {
            next.image = trimmed(Some(image));
        }
        if let Some(price) = self.price.as_ref().filter(|v| is_supplied(v)) {
            match coerce_price(price) {
                Ok(price) => next.price = price,
                Err(e) => errors.push(e),
            }
        }
        if let Some(stock) = self.stock.as_ref().filter(|v| is_supplied(v)) {
            match coerce_stock(stock).map(i32::try_from) {
                Some(Ok(s)) if s >= 0 => next.stock = s,
                Some(Ok(_)) => errors.push("stock cannot be negative".to_string()),
                _ => errors.push("stock must be a whole number".to_string()),
            }
        }
        if let Some(status) = parse_optional::<ProductStatus>(self.status.as_deref(), &mut errors) {
            next.status = status;
        }
        if let Some(specifications) = self.specifications {
            next.specifications = specifications;
        }
        if let Some(features) = self.features {
            next.features = clean_features(features);
        }

        let category = match trimmed(self.category.as_deref()) {
            Some(raw) => parse_into::<Category>(&raw, &mut errors),
            None => Some(existing.category()),
        };
        let ram = parse_optional::<Ram>(self.ram.as_deref(), &mut errors);
        let storage = parse_optional::<Storage>(self.storage.as_deref(), &mut errors);

        let (Some(category), true) = (category, errors.is_empty()) else {
            return Err(Invalid::fields(errors));
        };

        // Phone attributes carry over only while the product stays a phone
        next.kind = if category == Category::MobilePhone {
            ProductKind::from_parts(
                category,
                ram.or(existing.kind.ram()),
                storage.or(existing.kind.storage()),
            )?
        } else {
            ProductKind::from_parts(category, ram, storage)?
        };
        next.updated_at = now;

        Ok(next)
    }
}

fn is_supplied(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn parse_into<T: FromStr<Err = String>>(raw: &str, errors: &mut Vec<String>) -> Option<T> {
    raw.parse().map_err(|e| errors.push(e)).ok()
}

fn parse_optional<T: FromStr<Err = String>>(raw: Option<&str>, errors: &mut Vec<String>) -> Option<T> {
    trimmed(raw).and_then(|raw| parse_into(&raw, errors))
}

fn coerce_price(value: &Value) -> Result<Decimal, String> {
    let price = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Decimal::from(i)),
            None => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
        },
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };

    match price {
        Some(p) if p.is_sign_negative() && !p.is_zero() => Err("price cannot be negative".to_string()),
        Some(p) => Ok(p.normalize()),
        None => Err(format!("price must be a number, got {}", value)),
    }
}

fn coerce_stock(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

fn clean_features(features: Vec<String>) -> Vec<String> {
    features
        .into_iter()
        .filter_map(|f| trimmed(Some(&f)))
        .collect()
}

/// Storage-side shape of a product; column names double as filter fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub brand: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub color: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub description: Option<String>,
    pub image: Option<String>,
    pub stock: i32,
    pub status: String,
    pub specifications: sqlx::types::Json<BTreeMap<String, String>>,
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            category: p.category().as_str().to_string(),
            brand: p.brand.clone(),
            ram: p.kind.ram().map(|r| r.as_str().to_string()),
            storage: p.kind.storage().map(|s| s.as_str().to_string()),
            color: p.color.clone(),
            price: p.price,
            description: p.description.clone(),
            image: p.image.clone(),
            stock: p.stock,
            status: p.status.as_str().to_string(),
            specifications: sqlx::types::Json(p.specifications.clone()),
            features: p.features.clone(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = String;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category: Category = row.category.parse()?;
        let ram = row.ram.as_deref().map(Ram::from_str).transpose()?;
        let storage = row.storage.as_deref().map(Storage::from_str).transpose()?;
        let kind = ProductKind::from_parts(category, ram, storage)
            .map_err(|e| format!("product {}: {}", row.id, e.errors.join("; ")))?;

        Ok(Self {
            id: row.id,
            name: row.name,
            kind,
            brand: row.brand,
            color: row.color,
            price: row.price,
            description: row.description,
            image: row.image,
            stock: row.stock,
            status: row.status.parse()?,
            specifications: row.specifications.0,
            features: row.features,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
