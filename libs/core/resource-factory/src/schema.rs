//! Collection schema: field kinds, defaults and validators.

use chrono::DateTime;
use query_features::{FieldKind, Schema};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{PersistenceError, PersistenceResult};
use crate::Document;

/// Declared shape of one stored field
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldRule {
    pub kind: FieldKind,
    /// Stored as a list of `kind`
    pub many: bool,
    pub required: bool,
    pub unique: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Value stored on create when the field is absent
    pub default: Option<Value>,
}

impl FieldRule {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    pub fn reference() -> Self {
        Self::new(FieldKind::Reference)
    }

    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn check(&self, field: &str, value: &Value, problems: &mut Vec<String>) {
        if value.is_null() {
            if self.required {
                problems.push(format!("{} is required", field));
            }
            return;
        }

        if self.many {
            match value {
                Value::Array(items) => {
                    for item in items {
                        self.check_scalar(field, item, problems);
                    }
                }
                _ => problems.push(format!("{} must be a list", field)),
            }
        } else {
            self.check_scalar(field, value, problems);
        }
    }

    fn check_scalar(&self, field: &str, value: &Value, problems: &mut Vec<String>) {
        match (self.kind, value) {
            (FieldKind::String, Value::String(text)) => {
                let length = text.chars().count();
                if let Some(min) = self.min_length.filter(|min| length < *min) {
                    problems.push(format!("{} must be at least {} characters", field, min));
                }
                if let Some(max) = self.max_length.filter(|max| length > *max) {
                    problems.push(format!("{} cannot exceed {} characters", field, max));
                }
            }
            (FieldKind::Number, Value::Number(number)) => {
                let number = number.as_f64().unwrap_or_default();
                if let Some(min) = self.min.filter(|min| number < *min) {
                    problems.push(format!("{} must be greater than or equal to {}", field, min));
                }
                if let Some(max) = self.max.filter(|max| number > *max) {
                    problems.push(format!("{} must be less than or equal to {}", field, max));
                }
            }
            (FieldKind::Boolean, Value::Bool(_)) => {}
            (FieldKind::Date, Value::String(text)) => {
                if DateTime::parse_from_rfc3339(text).is_err() {
                    problems.push(format!("{} must be an RFC 3339 timestamp", field));
                }
            }
            (FieldKind::Reference, Value::String(id)) if !id.trim().is_empty() => {}
            (kind, _) => problems.push(format!("{} must be of type {}", field, kind)),
        }
    }
}

/// Field rules for one collection; undeclared fields are stored unchecked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionSchema {
    fields: BTreeMap<String, FieldRule>,
}

impl CollectionSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.insert(name.into(), rule);
        self
    }

    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, rule)| rule.unique)
            .map(|(name, _)| name)
    }

    /// Kinds used to coerce filter values
    pub fn query_schema(&self) -> Schema {
        self.iter()
            .map(|(name, rule)| (name.to_string(), rule.kind))
            .collect()
    }

    /// Fill absent fields that declare a default
    pub fn apply_defaults(&self, document: &mut Document) {
        for (name, rule) in self.iter() {
            if let Some(default) = &rule.default {
                if !document.contains_key(name) {
                    document.insert(name.to_string(), default.clone());
                }
            }
        }
    }

    /// Full-document check used on create
    pub fn validate_new(&self, document: &Document) -> PersistenceResult<()> {
        let mut problems = Vec::new();
        for (name, rule) in self.iter() {
            rule.check(name, document.get(name).unwrap_or(&Value::Null), &mut problems);
        }
        Self::finish(problems)
    }

    /// Check only the fields being changed
    pub fn validate_changes(&self, changes: &Document) -> PersistenceResult<()> {
        let mut problems = Vec::new();
        for (name, value) in changes {
            if let Some(rule) = self.rule(name) {
                rule.check(name, value, &mut problems);
            }
        }
        Self::finish(problems)
    }

    fn finish(problems: Vec<String>) -> PersistenceResult<()> {
        if problems.is_empty() {
            Ok(())
        } else {
            Err(PersistenceError::Validation(problems.join("; ")))
        }
    }
}
