use serde::{Deserialize, Serialize};
use std::fmt;

/// Field used when the request carries no `sort` parameter
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// `1` / `-1`, the usual document-store encoding
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Ordered list of sort keys; earlier keys take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec(Vec<SortKey>);

impl SortSpec {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self(keys)
    }

    /// Parse `price,-createdAt`. Absent or blank input yields the default.
    pub fn parse(raw: Option<&str>) -> Self {
        let keys: Vec<SortKey> = raw
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter_map(|segment| match segment.strip_prefix('-') {
                Some(field) if !field.is_empty() => Some(SortKey::desc(field)),
                Some(_) => None,
                None if !segment.is_empty() => Some(SortKey::asc(segment)),
                None => None,
            })
            .collect();

        if keys.is_empty() {
            Self::default()
        } else {
            Self(keys)
        }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self(vec![SortKey::desc(DEFAULT_SORT_FIELD)])
    }
}

impl fmt::Display for SortSpec {
    /// Space separated `-field` form
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|key| match key.direction {
                SortDirection::Ascending => key.field.clone(),
                SortDirection::Descending => format!("-{}", key.field),
            })
            .collect();
        f.write_str(&rendered.join(" "))
    }
}
