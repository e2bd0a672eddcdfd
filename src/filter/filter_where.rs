use serde_json::Value;

use super::error::FilterError;
use super::is_identifier;
use super::types::{FilterOp, FilterWhereInfo};

/// Compiles a where document into a parameterised Postgres predicate.
pub struct FilterWhere {
    param_values: Vec<Value>,
}

impl FilterWhere {
    pub fn generate(where_data: &Value) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self { param_values: vec![] };
        let sql = filter_where.build(where_data)?;
        Ok((sql, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<String, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok("1=1".to_string()),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        let mut sql_conditions = vec![];
        for (key, value) in obj {
            if key.starts_with('$') {
                sql_conditions.push(self.build_logical(key, value)?);
            } else {
                for condition in Self::parse_field_condition(key, value)? {
                    sql_conditions.push(self.build_sql_condition(&condition)?);
                }
            }
        }

        Ok(if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") })
    }

    fn build_logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    // Empty conjunction is true, empty disjunction is false
                    return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
                }
                let mut sql_parts = Vec::with_capacity(arr.len());
                for v in arr {
                    sql_parts.push(format!("({})", self.build(v)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sql_parts.join(joiner)))
            }
            "$not" => Ok(format!("NOT ({})", self.build(value)?)),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    pub(crate) fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        if !is_identifier(field) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }

        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() => obj
                .iter()
                .map(|(op_key, op_val)| {
                    let operator =
                        FilterOp::parse(op_key).ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                    Ok(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() })
                })
                .collect(),
            // Implicit equality: { field: value }
            _ => Ok(vec![FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() }]),
        }
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", condition.column);
        let data = condition.data.clone();
        Ok(match condition.operator {
            FilterOp::Eq if data.is_null() => format!("{} IS NULL", quoted_column),
            FilterOp::Eq => format!("{} = {}", quoted_column, self.param(data)),
            FilterOp::Ne if data.is_null() => format!("{} IS NOT NULL", quoted_column),
            FilterOp::Ne => format!("{} <> {}", quoted_column, self.param(data)),
            FilterOp::Gt => format!("{} > {}", quoted_column, self.param(data)),
            FilterOp::Gte => format!("{} >= {}", quoted_column, self.param(data)),
            FilterOp::Lt => format!("{} < {}", quoted_column, self.param(data)),
            FilterOp::Lte => format!("{} <= {}", quoted_column, self.param(data)),
            FilterOp::Like => format!("{} LIKE {}", quoted_column, self.string_param(data)?),
            FilterOp::ILike => format!("{} ILIKE {}", quoted_column, self.string_param(data)?),
            FilterOp::In => match data {
                Value::Array(values) if values.is_empty() => "1=0".to_string(),
                Value::Array(values) => {
                    let params: Vec<String> = values.into_iter().map(|v| self.param(v)).collect();
                    format!("{} IN ({})", quoted_column, params.join(", "))
                }
                other => format!("{} = {}", quoted_column, self.param(other)),
            },
        })
    }

    fn string_param(&mut self, value: Value) -> Result<String, FilterError> {
        if !value.is_string() {
            return Err(FilterError::InvalidOperatorData("pattern operators require a string".to_string()));
        }
        Ok(self.param(value))
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.param_values.len())
    }
}
