//! Helpers for the JSON text columns that hold nested documents.

use serde::{de::DeserializeOwned, Serialize};

/// Parse a JSON column, falling back to the type's default on absence or corruption
pub fn parse_json<T: DeserializeOwned + Default>(json: Option<&str>) -> T {
    json.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

/// Parse an optional nested document column
pub fn parse_optional<T: DeserializeOwned>(json: Option<&str>) -> Option<T> {
    json.and_then(|s| serde_json::from_str(s).ok())
}

/// Serialize an optional nested document for storage
pub fn serialize_optional<T: Serialize>(value: Option<&T>) -> Result<Option<String>, serde_json::Error> {
    value.map(serde_json::to_string).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_defaults() {
        let empty: Vec<String> = parse_json(None);
        assert!(empty.is_empty());

        let corrupt: Vec<String> = parse_json(Some("{not json"));
        assert!(corrupt.is_empty());

        let deals: Vec<String> = parse_json(Some(r#"["food","travel"]"#));
        assert_eq!(deals, vec!["food", "travel"]);
    }

    #[test]
    fn test_serialize_optional() {
        assert_eq!(serialize_optional::<Vec<u8>>(None).unwrap(), None);
        assert_eq!(
            serialize_optional(Some(&vec!["a"])).unwrap().as_deref(),
            Some(r#"["a"]"#)
        );
    }
}
