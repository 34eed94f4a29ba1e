use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{QueryError, QueryResult};

/// Internal document version marker, hidden unless explicitly requested
pub const VERSION_FIELD: &str = "__v";

/// Identifier field, always kept by inclusion projections
pub const ID_FIELD: &str = "_id";

/// Which fields a query returns.
///
/// `fields=a,b` includes `a`, `b` and `_id`. `fields=-a,-b` excludes `a`, `b`
/// and the version field. No `fields` parameter excludes only the version
/// field. Mixing both forms is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "fields")]
pub enum Projection {
    Include(Vec<String>),
    Exclude(Vec<String>),
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Exclude(vec![VERSION_FIELD.to_string()])
    }
}

impl Projection {
    pub fn parse(raw: Option<&str>) -> QueryResult<Self> {
        let Some(raw) = raw else {
            return Ok(Self::default());
        };

        let segments: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "-")
            .collect();

        if segments.is_empty() {
            return Ok(Self::default());
        }

        let excluded = segments.iter().filter(|s| s.starts_with('-')).count();
        if excluded == 0 {
            let mut fields: Vec<String> = Vec::with_capacity(segments.len());
            for segment in segments {
                if !fields.iter().any(|f| f == segment) {
                    fields.push(segment.to_string());
                }
            }
            Ok(Projection::Include(fields))
        } else if excluded == segments.len() {
            let mut fields = vec![VERSION_FIELD.to_string()];
            for segment in segments {
                let field = &segment[1..];
                if !fields.iter().any(|f| f == field) {
                    fields.push(field.to_string());
                }
            }
            Ok(Projection::Exclude(fields))
        } else {
            Err(QueryError::MixedProjection(raw.to_string()))
        }
    }

    /// Apply the projection to a JSON document (top-level fields only)
    pub fn apply(&self, document: Map<String, Value>) -> Map<String, Value> {
        match self {
            Projection::Include(fields) => document
                .into_iter()
                .filter(|(k, _)| k == ID_FIELD || fields.iter().any(|f| f == k))
                .collect(),
            Projection::Exclude(fields) => document
                .into_iter()
                .filter(|(k, _)| !fields.iter().any(|f| f == k))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Map<String, Value> {
        json!({"_id": "1", "name": "Phones", "slug": "phones", "__v": 0})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_default_hides_version_field() {
        let projected = Projection::parse(None).unwrap().apply(doc());
        assert!(!projected.contains_key("__v"));
        assert!(projected.contains_key("name"));
    }

    #[test]
    fn test_include_keeps_id_and_listed_fields() {
        let projection = Projection::parse(Some("name, name")).unwrap();
        assert_eq!(projection, Projection::Include(vec!["name".to_string()]));

        let projected = projection.apply(doc());
        assert_eq!(projected.len(), 2);
        assert!(projected.contains_key("_id"));
        assert!(projected.contains_key("name"));
    }

    #[test]
    fn test_explicit_version_field_is_returned() {
        let projected = Projection::parse(Some("name,__v")).unwrap().apply(doc());
        assert!(projected.contains_key("__v"));
    }

    #[test]
    fn test_exclude_also_hides_version_field() {
        let projection = Projection::parse(Some("-slug")).unwrap();
        assert_eq!(
            projection,
            Projection::Exclude(vec!["__v".to_string(), "slug".to_string()])
        );
        let projected = projection.apply(doc());
        assert!(!projected.contains_key("slug"));
        assert!(!projected.contains_key("__v"));
    }

    #[test]
    fn test_mixed_projection_is_rejected() {
        assert!(matches!(
            Projection::parse(Some("name,-slug")),
            Err(QueryError::MixedProjection(_))
        ));
    }
}
