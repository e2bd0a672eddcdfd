use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use super::error::FilterError;
use super::filter_where::FilterWhere;
use super::types::{FilterOp, FilterWhereInfo};

/// Evaluates a where document against an in-memory JSON row, following the
/// same semantics as the SQL [`FilterWhere`] compiles to: comparisons against
/// a NULL column are never true, only `{ field: null }` matches it.
pub struct FilterMatch;

impl FilterMatch {
    pub fn matches(where_data: &Value, doc: &Value) -> Result<bool, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(true),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        for (key, value) in obj {
            let matched = if key.starts_with('$') {
                Self::matches_logical(key, value, doc)?
            } else {
                let mut all = true;
                for condition in FilterWhere::parse_field_condition(key, value)? {
                    if !Self::matches_condition(&condition, doc)? {
                        all = false;
                        break;
                    }
                }
                all
            };
            if !matched {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matches_logical(op: &str, value: &Value, doc: &Value) -> Result<bool, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let mut results = Vec::with_capacity(arr.len());
                for clause in arr {
                    results.push(Self::matches(clause, doc)?);
                }
                Ok(if op == "$and" { results.iter().all(|m| *m) } else { results.iter().any(|m| *m) })
            }
            "$not" => Ok(!Self::matches(value, doc)?),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn matches_condition(condition: &FilterWhereInfo, doc: &Value) -> Result<bool, FilterError> {
        let field = doc.get(condition.column.as_str()).unwrap_or(&Value::Null);
        let data = &condition.data;

        Ok(match condition.operator {
            FilterOp::Eq if data.is_null() => field.is_null(),
            FilterOp::Ne if data.is_null() => !field.is_null(),
            _ if field.is_null() => false,
            FilterOp::Eq => values_equal(field, data),
            FilterOp::Ne => !values_equal(field, data),
            FilterOp::Gt => comparable(field, data) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(comparable(field, data), Some(Ordering::Greater | Ordering::Equal)),
            FilterOp::Lt => comparable(field, data) == Some(Ordering::Less),
            FilterOp::Lte => matches!(comparable(field, data), Some(Ordering::Less | Ordering::Equal)),
            FilterOp::Like | FilterOp::ILike => {
                let pattern = data
                    .as_str()
                    .ok_or_else(|| FilterError::InvalidOperatorData("pattern operators require a string".to_string()))?;
                match field.as_str() {
                    Some(text) => like_matches(pattern, text, condition.operator == FilterOp::ILike),
                    None => false,
                }
            }
            FilterOp::In => match data {
                Value::Array(values) => values.iter().any(|v| values_equal(field, v)),
                other => values_equal(field, other),
            },
        })
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Ordering between two values of the same kind; `None` when the kinds differ.
fn comparable(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_)) | (Value::Bool(_), Value::Bool(_)) => {
            Some(compare_values(a, b))
        }
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

fn kind_rank(v: &Value) -> u8 {
    match v {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

/// Total order over JSON values used for in-memory sorting. Numbers compare
/// numerically, RFC 3339 strings chronologically, other strings lexically.
/// NULL sorts after everything, as Postgres does for ascending order.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(tx), Some(ty)) => tx.cmp(&ty),
            _ => x.cmp(y),
        },
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

#[derive(Debug, PartialEq)]
enum LikeToken {
    Literal(char),
    AnyOne,
    AnyMany,
}

fn tokenize(pattern: &str, fold: bool) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '\\' => match chars.next() {
                Some(escaped) => LikeToken::Literal(fold_char(escaped, fold)),
                None => LikeToken::Literal('\\'),
            },
            '%' => LikeToken::AnyMany,
            '_' => LikeToken::AnyOne,
            other => LikeToken::Literal(fold_char(other, fold)),
        });
    }
    tokens
}

fn fold_char(c: char, fold: bool) -> char {
    if fold {
        c.to_lowercase().next().unwrap_or(c)
    } else {
        c
    }
}

/// SQL LIKE semantics: `%` any run, `_` any single char, `\` escapes.
pub fn like_matches(pattern: &str, text: &str, case_insensitive: bool) -> bool {
    let tokens = tokenize(pattern, case_insensitive);
    let text: Vec<char> = text.chars().map(|c| fold_char(c, case_insensitive)).collect();

    // matched[j]: tokens[..i] match text[..j]
    let mut matched = vec![false; text.len() + 1];
    matched[0] = true;
    for token in &tokens {
        let mut next = vec![false; text.len() + 1];
        match token {
            LikeToken::AnyMany => {
                let mut reachable = false;
                for j in 0..=text.len() {
                    reachable |= matched[j];
                    next[j] = reachable;
                }
            }
            LikeToken::AnyOne => {
                for j in 1..=text.len() {
                    next[j] = matched[j - 1];
                }
            }
            LikeToken::Literal(c) => {
                for j in 1..=text.len() {
                    next[j] = matched[j - 1] && text[j - 1] == *c;
                }
            }
        }
        matched = next;
    }
    matched[text.len()]
}
