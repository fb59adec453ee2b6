//! Record access helpers.
//!
//! Records are plain JSON objects. This module contains the functions every
//! stage uses to read them:
//! - get_field_value: Extract nested field values by dotted path
//! - primary_element: Primary-or-first element of a sub-collection
//! - ValueSource: Declarative column value extraction
//! - value_to_text / value_to_f64: Scalar coercions with zero-value defaults

use serde::{Deserialize, Serialize};
use serde_json::Value;

static NULL: Value = Value::Null;

/// Name of the flag marking the preferred element of a sub-collection.
pub const PRIMARY_FLAG: &str = "isPrimary";

/// Extract a nested field value from a record.
///
/// # Arguments
/// * `value` - The JSON value to extract from
/// * `field_path` - Dot-separated field path (e.g., "address.city")
///
/// # Returns
/// The field value, or Value::Null if not found
#[inline]
pub fn get_field_value<'a>(value: &'a Value, field_path: &str) -> &'a Value {
    let mut current = value;

    for part in field_path.split('.') {
        match current.get(part) {
            Some(val) => current = val,
            None => return &NULL,
        }
    }

    current
}

/// Elements of a one-to-many sub-collection. Absent or non-array fields
/// yield an empty slice.
#[inline]
pub fn collection_elements<'a>(record: &'a Value, collection: &str) -> &'a [Value] {
    match get_field_value(record, collection) {
        Value::Array(items) => items.as_slice(),
        _ => &[],
    }
}

/// Pick the element flagged `isPrimary`, else the first element, else None.
pub fn primary_element<'a>(record: &'a Value, collection: &str) -> Option<&'a Value> {
    let items = collection_elements(record, collection);
    items
        .iter()
        .find(|item| item.get(PRIMARY_FLAG).and_then(Value::as_bool) == Some(true))
        .or_else(|| items.first())
}

/// Render a scalar the way a list cell shows it.
///
/// - String: as is
/// - Number: integral values without a fractional part
/// - Bool: "true" / "false"
/// - Null, Array, Object: empty string
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            Some(f) => format!("{}", f),
            None => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Coerce a value to a number. Numeric strings are parsed; anything else,
/// including `"NaN"` and `"inf"`, is 0.
pub fn value_to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// True when the value carries nothing worth displaying.
#[inline]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Case-insensitive substring test. `needle` must already be lower-cased.
#[inline]
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn default_separator() -> String {
    ", ".to_string()
}

/// Where a column reads its value from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueSource {
    /// A scalar at a dotted path.
    Field { path: String },
    /// Fields of the primary-or-first element of a sub-collection. Several
    /// fields are joined with `separator`, skipping blank ones.
    Primary {
        collection: String,
        fields: Vec<String>,
        #[serde(default = "default_separator")]
        separator: String,
    },
    /// A boolean rendered as one of two labels.
    Flag {
        path: String,
        when_true: String,
        when_false: String,
    },
    /// First non-blank value among several paths.
    Coalesce { paths: Vec<String> },
}

impl ValueSource {
    pub fn field(path: &str) -> Self {
        ValueSource::Field {
            path: path.to_string(),
        }
    }

    pub fn primary(collection: &str, fields: &[&str]) -> Self {
        ValueSource::Primary {
            collection: collection.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            separator: default_separator(),
        }
    }

    pub fn flag(path: &str, when_true: &str, when_false: &str) -> Self {
        ValueSource::Flag {
            path: path.to_string(),
            when_true: when_true.to_string(),
            when_false: when_false.to_string(),
        }
    }

    pub fn coalesce(paths: &[&str]) -> Self {
        ValueSource::Coalesce {
            paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Resolve the value for one record. Absent values come back as Null.
    pub fn resolve(&self, record: &Value) -> Value {
        match self {
            ValueSource::Field { path } => get_field_value(record, path).clone(),
            ValueSource::Primary {
                collection,
                fields,
                separator,
            } => {
                let Some(element) = primary_element(record, collection) else {
                    return Value::Null;
                };
                if let [single] = fields.as_slice() {
                    return get_field_value(element, single).clone();
                }
                let parts: Vec<String> = fields
                    .iter()
                    .map(|f| value_to_text(get_field_value(element, f)))
                    .filter(|s| !s.trim().is_empty())
                    .collect();
                if parts.is_empty() {
                    Value::Null
                } else {
                    Value::String(parts.join(separator))
                }
            }
            ValueSource::Flag {
                path,
                when_true,
                when_false,
            } => {
                let flag = get_field_value(record, path).as_bool().unwrap_or(false);
                let label = if flag { when_true } else { when_false };
                Value::String(label.clone())
            }
            ValueSource::Coalesce { paths } => paths
                .iter()
                .map(|p| get_field_value(record, p))
                .find(|v| !is_blank(v))
                .cloned()
                .unwrap_or(Value::Null),
        }
    }

    /// Resolve and render as text.
    pub fn resolve_text(&self, record: &Value) -> String {
        value_to_text(&self.resolve(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn account() -> Value {
        json!({
            "code": "ABC01",
            "name": "ABC Farms",
            "active": true,
            "contacts": [
                {"name": "Ann", "email": "ann@abc.com", "isPrimary": false},
                {"name": "Bob", "email": "bob@abc.com", "isPrimary": true}
            ],
            "addresses": [
                {"city": "Fresno", "state": "CA"},
                {"city": "Modesto", "state": "CA"}
            ]
        })
    }

    #[test]
    fn test_get_field_value() {
        let doc = json!({"name": "Alice", "address": {"city": "NYC"}});
        assert_eq!(get_field_value(&doc, "name"), &json!("Alice"));
        assert_eq!(get_field_value(&doc, "address.city"), &json!("NYC"));
        assert_eq!(get_field_value(&doc, "missing"), &Value::Null);
        assert_eq!(get_field_value(&doc, "address.zip"), &Value::Null);
    }

    #[test]
    fn test_primary_element_prefers_flag() {
        let doc = account();
        let contact = primary_element(&doc, "contacts").unwrap();
        assert_eq!(contact["name"], "Bob");
    }

    #[test]
    fn test_primary_element_falls_back_to_first() {
        let doc = account();
        let address = primary_element(&doc, "addresses").unwrap();
        assert_eq!(address["city"], "Fresno");

        let empty = json!({"contacts": []});
        assert!(primary_element(&empty, "contacts").is_none());
        assert!(primary_element(&empty, "addresses").is_none());
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!("x")), "x");
        assert_eq!(value_to_text(&json!(1500)), "1500");
        assert_eq!(value_to_text(&json!(1500.0)), "1500");
        assert_eq!(value_to_text(&json!(12.5)), "12.5");
        assert_eq!(value_to_text(&json!(true)), "true");
        assert_eq!(value_to_text(&Value::Null), "");
    }

    #[test]
    fn test_value_to_f64() {
        assert_eq!(value_to_f64(&json!(3)), 3.0);
        assert_eq!(value_to_f64(&json!("12.75")), 12.75);
        assert_eq!(value_to_f64(&json!("n/a")), 0.0);
        assert_eq!(value_to_f64(&Value::Null), 0.0);
    }

    #[test]
    fn test_value_to_f64_rejects_non_finite_strings() {
        for text in ["NaN", "nan", "inf", "-inf", "infinity", " NaN "] {
            assert_eq!(value_to_f64(&json!(text)), 0.0, "{}", text);
        }
        assert_eq!(value_to_f64(&json!("-2.5")), -2.5);
    }

    #[test]
    fn test_value_sources() {
        let doc = account();
        assert_eq!(ValueSource::field("code").resolve(&doc), json!("ABC01"));
        assert_eq!(
            ValueSource::primary("contacts", &["email"]).resolve(&doc),
            json!("bob@abc.com")
        );
        assert_eq!(
            ValueSource::primary("addresses", &["city", "state"]).resolve(&doc),
            json!("Fresno, CA")
        );
        assert_eq!(
            ValueSource::flag("active", "active", "inactive").resolve(&doc),
            json!("active")
        );
        assert_eq!(
            ValueSource::coalesce(&["nickname", "name"]).resolve(&doc),
            json!("ABC Farms")
        );
        assert_eq!(
            ValueSource::primary("phones", &["number"]).resolve(&doc),
            Value::Null
        );
    }

    #[test]
    fn test_value_source_from_json() {
        let source: ValueSource = serde_json::from_value(json!({
            "kind": "primary",
            "collection": "addresses",
            "fields": ["city", "state"]
        }))
        .unwrap();
        assert_eq!(source, ValueSource::primary("addresses", &["city", "state"]));
    }
}
