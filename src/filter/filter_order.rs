use std::cmp::Ordering;

use serde_json::Value;

use super::error::FilterError;
use super::filter_match::compare_values;
use super::is_identifier;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::Null => vec![],
            Value::String(s) => Self::parse_order_string(s)?,
            Value::Array(arr) => {
                // Array of strings like ["created_at desc", "name asc"]
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_order_string(s)?),
                        other => {
                            return Err(FilterError::InvalidOperatorData(format!("Invalid order entry: {}", other)))
                        }
                    }
                }
                out
            }
            Value::Object(obj) => {
                // { "created_at": "desc", "name": "asc" }
                let mut out = Vec::new();
                for (k, v) in obj {
                    out.push(FilterOrderInfo { column: k.clone(), sort: Self::parse_direction(v.as_str().unwrap_or("asc"))? });
                }
                out
            }
            other => return Err(FilterError::InvalidOperatorData(format!("Invalid order: {}", other))),
        };

        for info in &infos {
            if !is_identifier(&info.column) {
                return Err(FilterError::InvalidColumn(info.column.clone()));
            }
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        // Split on commas, then each token into column and direction
        let mut out = Vec::new();
        for part in s.split(',') {
            let mut it = part.split_whitespace();
            if let Some(col) = it.next() {
                let sort = Self::parse_direction(it.next().unwrap_or("asc"))?;
                out.push(FilterOrderInfo { column: col.to_string(), sort });
            }
        }
        Ok(out)
    }

    fn parse_direction(dir: &str) -> Result<SortDirection, FilterError> {
        match dir.to_ascii_lowercase().as_str() {
            "asc" | "1" => Ok(SortDirection::Asc),
            "desc" | "-1" => Ok(SortDirection::Desc),
            other => Err(FilterError::InvalidOperatorData(format!("Invalid sort direction: {}", other))),
        }
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos.iter().map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql())).collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    /// Orders two documents the way the generated ORDER BY would.
    pub fn compare(infos: &[FilterOrderInfo], a: &Value, b: &Value) -> Ordering {
        for info in infos {
            let ordering = compare_values(&a[info.column.as_str()], &b[info.column.as_str()]);
            let ordering = match info.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_string_array_and_object_forms() {
        let infos = FilterOrder::validate_and_parse(&json!("created_at desc, name")).unwrap();
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"created_at\" DESC, \"name\" ASC");

        let infos = FilterOrder::validate_and_parse(&json!(["price asc", "id desc"])).unwrap();
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"price\" ASC, \"id\" DESC");

        let infos = FilterOrder::validate_and_parse(&json!({ "stock": "desc" })).unwrap();
        assert_eq!(infos[0].sort, SortDirection::Desc);
    }

    #[test]
    fn rejects_bad_columns_and_directions() {
        assert!(FilterOrder::validate_and_parse(&json!("name; drop")).is_err());
        assert!(FilterOrder::validate_and_parse(&json!("name sideways")).is_err());
    }

    #[test]
    fn compares_documents_with_tiebreak() {
        let infos = FilterOrder::validate_and_parse(&json!(["stock desc", "name asc"])).unwrap();
        let a = json!({ "stock": 5, "name": "b" });
        let b = json!({ "stock": 5, "name": "a" });
        let c = json!({ "stock": 9, "name": "z" });
        assert_eq!(FilterOrder::compare(&infos, &a, &b), Ordering::Greater);
        assert_eq!(FilterOrder::compare(&infos, &c, &a), Ordering::Less);
    }
}
