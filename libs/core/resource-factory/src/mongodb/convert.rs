//! JSON <-> BSON conversion and query translation for the MongoDB adapter.
//!
//! `_id` and reference fields are stored as ObjectIds and timestamps as BSON
//! dates; both are exposed to callers as strings.

use chrono::NaiveDate;
use mongodb::bson::{self, Bson, DateTime, doc, oid::ObjectId};
use query_features::{
    Comparison, ComparisonOperator, FieldKind, Populate, Projection, QueryFilter, SortSpec,
    VERSION_FIELD,
};
use serde_json::Value;

use crate::error::{PersistenceError, PersistenceResult};
use crate::schema::CollectionSchema;
use crate::{CREATED_AT_FIELD, Document, ID_FIELD, UPDATED_AT_FIELD};

/// Storage kind of `field`, including the managed fields
pub fn field_kind(schema: &CollectionSchema, field: &str) -> Option<FieldKind> {
    match field {
        ID_FIELD => Some(FieldKind::Reference),
        CREATED_AT_FIELD | UPDATED_AT_FIELD => Some(FieldKind::Date),
        _ => schema.rule(field).map(|rule| rule.kind),
    }
}

pub fn parse_object_id(id: &str) -> PersistenceResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| PersistenceError::InvalidId(id.to_string()))
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` read as midnight UTC
pub fn parse_date(text: &str) -> PersistenceResult<DateTime> {
    if let Ok(date) = DateTime::parse_rfc3339_str(text) {
        return Ok(date);
    }
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| DateTime::from_millis(midnight.and_utc().timestamp_millis()))
        .ok_or_else(|| PersistenceError::Validation(format!("'{}' is not a valid date", text)))
}

/// Convert one value, element-wise for arrays
pub fn to_bson_value(kind: Option<FieldKind>, value: &Value) -> PersistenceResult<Bson> {
    match (kind, value) {
        (_, Value::Array(items)) => items
            .iter()
            .map(|item| to_bson_value(kind, item))
            .collect::<PersistenceResult<Vec<_>>>()
            .map(Bson::Array),
        (Some(FieldKind::Reference), Value::String(id)) => parse_object_id(id).map(Bson::ObjectId),
        (Some(FieldKind::Date), Value::String(text)) => parse_date(text).map(Bson::DateTime),
        (_, other) => {
            bson::to_bson(other).map_err(|e| PersistenceError::Validation(e.to_string()))
        }
    }
}

pub fn to_bson_document(
    schema: &CollectionSchema,
    data: &Document,
) -> PersistenceResult<bson::Document> {
    let mut document = bson::Document::new();
    for (field, value) in data {
        document.insert(field.clone(), to_bson_value(field_kind(schema, field), value)?);
    }
    Ok(document)
}

pub fn to_json_value(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(date) => date
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or(Value::Null),
        Bson::Document(document) => Value::Object(to_json_document(document)),
        Bson::Array(items) => Value::Array(items.into_iter().map(to_json_value).collect()),
        Bson::String(text) => Value::String(text),
        Bson::Boolean(flag) => Value::Bool(flag),
        Bson::Int32(number) => Value::from(number),
        Bson::Int64(number) => Value::from(number),
        Bson::Double(number) => serde_json::Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::Null | Bson::Undefined => Value::Null,
        other => other.into_relaxed_extjson(),
    }
}

pub fn to_json_document(document: bson::Document) -> Document {
    document
        .into_iter()
        .map(|(key, value)| (key, to_json_value(value)))
        .collect()
}

fn comparison_value(kind: Option<FieldKind>, comparison: &Comparison) -> PersistenceResult<Bson> {
    match comparison.operator {
        ComparisonOperator::Other(_) => {
            bson::to_bson(&comparison.value).map_err(|e| PersistenceError::Validation(e.to_string()))
        }
        _ => to_bson_value(kind, &comparison.value),
    }
}

/// Filter document for a query filter: equality as `field: value`, other
/// operators as `field: { $op: value }`, search as a case-insensitive `$or`
/// of literal regexes.
pub fn filter_document(
    schema: &CollectionSchema,
    filter: &QueryFilter,
) -> PersistenceResult<bson::Document> {
    let mut document = bson::Document::new();

    for (field, comparisons) in filter.expression.iter() {
        let kind = field_kind(schema, field);
        if let [only] = comparisons {
            if only.operator == ComparisonOperator::Eq {
                document.insert(field, comparison_value(kind, only)?);
                continue;
            }
        }

        let mut operators = bson::Document::new();
        for comparison in comparisons {
            operators.insert(
                comparison.operator.engine_name(),
                comparison_value(kind, comparison)?,
            );
        }
        document.insert(field, operators);
    }

    if let Some(search) = &filter.search {
        let pattern = search.pattern();
        let clauses: Vec<Bson> = search
            .fields()
            .iter()
            .map(|field| {
                let mut clause = bson::Document::new();
                clause.insert(field.clone(), doc! { "$regex": pattern.as_str(), "$options": "i" });
                Bson::Document(clause)
            })
            .collect();
        document.insert("$or", clauses);
    }

    Ok(document)
}

pub fn sort_document(sort: &SortSpec) -> Option<bson::Document> {
    if sort.is_empty() {
        return None;
    }
    let mut document = bson::Document::new();
    for key in sort.keys() {
        document.insert(key.field.clone(), key.direction.as_i32());
    }
    Some(document)
}

pub fn projection_document(projection: &Projection) -> bson::Document {
    let (fields, flag) = match projection {
        Projection::Include(fields) => (fields, 1),
        Projection::Exclude(fields) => (fields, 0),
    };
    let mut document = bson::Document::new();
    for field in fields {
        document.insert(field.clone(), flag);
    }
    document
}

/// Projection applied to documents pulled in by an expansion
pub fn populate_projection(populate: &Populate) -> bson::Document {
    if populate.select.is_empty() {
        doc! { VERSION_FIELD: 0 }
    } else {
        projection_document(&Projection::Include(populate.select.clone()))
    }
}

/// Reference ids stored at `path` across `documents`
pub fn referenced_ids(documents: &[Document], path: &str) -> Vec<ObjectId> {
    let mut ids: Vec<ObjectId> = documents
        .iter()
        .filter_map(|document| document.get(path))
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect::<Vec<_>>(),
            Value::String(id) => vec![id.as_str()],
            _ => Vec::new(),
        })
        .filter_map(|id| ObjectId::parse_str(id).ok())
        .collect();
    ids.sort();
    ids.dedup();
    ids
}
