//! Field kinds used to coerce string request values into typed filter values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use strum::{Display, EnumString};

use crate::error::{QueryError, QueryResult};

/// Scalar kind of a stored field (element kind for list fields).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
    #[default]
    String,
    Number,
    Boolean,
    /// RFC 3339 timestamp stored as a string
    Date,
    /// Identifier of a document in another collection
    Reference,
}

impl FieldKind {
    /// Convert a raw request value into a JSON value of this kind.
    pub fn coerce(&self, field: &str, raw: &str) -> QueryResult<Value> {
        let invalid = |expected| QueryError::InvalidValue {
            field: field.to_string(),
            value: raw.to_string(),
            expected,
        };

        match self {
            FieldKind::String | FieldKind::Date | FieldKind::Reference => {
                Ok(Value::String(raw.to_string()))
            }
            FieldKind::Number => {
                let trimmed = raw.trim();
                if let Ok(int) = trimmed.parse::<i64>() {
                    return Ok(Value::from(int));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| invalid("a number"))
            }
            FieldKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(invalid("a boolean")),
            },
        }
    }
}

/// Field name to kind mapping for one collection.
///
/// Fields absent from the schema keep their string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: BTreeMap<String, FieldKind>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Coerce a value for `field`; unknown fields stay strings.
    pub fn coerce(&self, field: &str, raw: &str) -> QueryResult<Value> {
        match self.kind_of(field) {
            Some(kind) => kind.coerce(field, raw),
            None => Ok(Value::String(raw.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, FieldKind)> for Schema {
    fn from_iter<I: IntoIterator<Item = (String, FieldKind)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_coercion_prefers_integers() {
        assert_eq!(FieldKind::Number.coerce("price", "100").unwrap(), Value::from(100));
        assert_eq!(
            FieldKind::Number.coerce("price", "99.5").unwrap(),
            Value::from(99.5)
        );
    }

    #[test]
    fn test_number_coercion_rejects_text() {
        let err = FieldKind::Number.coerce("price", "cheap").unwrap_err();
        assert!(err.to_string().contains("price"));
        assert!(err.to_string().contains("a number"));
    }

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(
            FieldKind::Boolean.coerce("active", "TRUE").unwrap(),
            Value::Bool(true)
        );
        assert!(FieldKind::Boolean.coerce("active", "yes").is_err());
    }

    #[test]
    fn test_unknown_field_stays_string() {
        let schema = Schema::new().field("price", FieldKind::Number);
        assert_eq!(
            schema.coerce("color", "42").unwrap(),
            Value::String("42".to_string())
        );
        assert_eq!(schema.coerce("price", "42").unwrap(), Value::from(42));
    }
}
