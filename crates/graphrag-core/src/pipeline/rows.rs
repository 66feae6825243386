//! Helpers for reading fields out of fetched rows.
//!
//! Backends return rows as JSON objects keyed by the RETURN aliases; these
//! accessors keep the engines tolerant of missing or null columns.

use crate::traits::Row;

/// Read a string column.
pub fn get_str(row: &Row, key: &str) -> Option<String> {
    row.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// Read an integer column.
pub fn get_i64(row: &Row, key: &str) -> Option<i64> {
    row.get(key).and_then(|v| v.as_i64())
}

/// Read a list-of-strings column; null or missing becomes empty.
pub fn get_string_list(row: &Row, key: &str) -> Vec<String> {
    row.get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_accessors() {
        let row = json!({
            "name": "Tomaz",
            "level": 2,
            "descriptions": ["a", "b"],
            "summary": null,
        });

        assert_eq!(get_str(&row, "name").as_deref(), Some("Tomaz"));
        assert_eq!(get_str(&row, "summary"), None);
        assert_eq!(get_str(&row, "missing"), None);
        assert_eq!(get_i64(&row, "level"), Some(2));
        assert_eq!(get_string_list(&row, "descriptions"), vec!["a", "b"]);
        assert!(get_string_list(&row, "summary").is_empty());
    }
}
