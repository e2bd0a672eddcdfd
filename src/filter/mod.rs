pub mod error;
pub mod filter;
pub mod filter_match;
pub mod filter_order;
pub mod filter_where;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use filter_match::FilterMatch;
pub use types::*;

/// LIKE pattern matching `needle` anywhere in the value, wildcards escaped.
pub fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Shared identifier rule for tables and columns: `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(contains_pattern("sam"), "%sam%");
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("created_at"));
        assert!(is_identifier("_id"));
        assert!(!is_identifier("1name"));
        assert!(!is_identifier("name; DROP TABLE products"));
        assert!(!is_identifier(""));
    }
}
