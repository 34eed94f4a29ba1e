//! In-memory document store.
//!
//! Collections share one store so expansions can read across them. Ids are
//! UUID v7 strings, so the natural order is insertion order. Every operation
//! takes the store lock once, which makes single-document writes atomic.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use query_features::{
    FieldKind, FilterExpression, FindQuery, Populate, Projection, QueryFilter, VERSION_FIELD,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use crate::collection::{DocumentCollection, UpdateOptions};
use crate::error::{PersistenceError, PersistenceResult};
use crate::schema::CollectionSchema;
use crate::{CREATED_AT_FIELD, Document, ID_FIELD, UPDATED_AT_FIELD};

#[derive(Default)]
struct Store {
    collections: HashMap<String, BTreeMap<String, Document>>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Store {
    /// Strictly increasing wall-clock timestamp
    fn next_timestamp(&mut self) -> String {
        let now = Utc::now();
        let next = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(next);
        next.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn documents(&self, collection: &str) -> impl Iterator<Item = &Document> {
        self.collections
            .get(collection)
            .into_iter()
            .flat_map(|documents| documents.values())
    }

    fn expand(&self, document: &mut Document, expansions: &[Populate]) {
        for expansion in expansions {
            let Some(stored) = document.get_mut(&expansion.path) else {
                continue;
            };
            let related = self.collections.get(&expansion.from);
            let resolve = |id: &str| -> Option<Document> {
                let id = canonical_id(id)?;
                related
                    .and_then(|documents| documents.get(&id))
                    .map(|found| select(found, &expansion.select))
            };
            *stored = match stored.take() {
                Value::String(id) => resolve(&id).map(Value::Object).unwrap_or(Value::Null),
                Value::Array(ids) => Value::Array(
                    ids.iter()
                        .filter_map(Value::as_str)
                        .filter_map(|id| resolve(id))
                        .map(Value::Object)
                        .collect(),
                ),
                other => other,
            };
        }
    }
}

/// Related document reduced to `_id` plus `fields` (all but the version
/// field when `fields` is empty)
fn select(document: &Document, fields: &[String]) -> Document {
    let projection = if fields.is_empty() {
        Projection::default()
    } else {
        Projection::Include(fields.to_vec())
    };
    projection.apply(document.clone())
}

/// Lowercase hyphenated form of a UUID id
fn canonical_id(id: &str) -> Option<String> {
    Uuid::parse_str(id).ok().map(|uuid| uuid.to_string())
}

fn parse_id(id: &str) -> PersistenceResult<String> {
    canonical_id(id).ok_or_else(|| PersistenceError::InvalidId(id.to_string()))
}

fn is_reference(schema: &CollectionSchema, field: &str) -> bool {
    field == ID_FIELD
        || schema
            .rule(field)
            .is_some_and(|rule| rule.kind == FieldKind::Reference)
}

/// Rewrite reference values to their canonical id; malformed ids are rejected.
fn normalize_references(
    schema: &CollectionSchema,
    document: &mut Document,
) -> PersistenceResult<()> {
    for (field, value) in document.iter_mut() {
        if field == ID_FIELD || !is_reference(schema, field) {
            continue;
        }
        match value {
            Value::String(id) => *id = parse_id(id)?,
            Value::Array(items) => {
                for item in items.iter_mut() {
                    if let Value::String(id) = item {
                        *id = parse_id(id)?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Canonical spelling for reference comparisons; unparseable values are kept
/// and simply match nothing.
fn canonicalize(value: &mut Value) {
    match value {
        Value::String(id) => {
            if let Some(canonical) = canonical_id(id) {
                *id = canonical;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(canonicalize),
        _ => {}
    }
}

fn check_unique(
    schema: &CollectionSchema,
    documents: Option<&BTreeMap<String, Document>>,
    candidate: &Document,
    own_id: Option<&str>,
) -> PersistenceResult<()> {
    let Some(documents) = documents else {
        return Ok(());
    };
    for field in schema.unique_fields() {
        let Some(value) = candidate.get(field).filter(|v| !v.is_null()) else {
            continue;
        };
        let taken = documents
            .iter()
            .filter(|(id, _)| Some(id.as_str()) != own_id)
            .any(|(_, existing)| existing.get(field) == Some(value));
        if taken {
            return Err(PersistenceError::DuplicateKey {
                field: field.to_string(),
                message: format!("duplicate key: {} = {}", field, value),
            });
        }
    }
    Ok(())
}

/// Handle to a shared in-memory store
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    store: Arc<RwLock<Store>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection `name` validated against `schema`
    pub fn collection(&self, name: impl Into<String>, schema: CollectionSchema) -> InMemoryCollection {
        InMemoryCollection {
            name: name.into(),
            schema,
            store: Arc::clone(&self.store),
        }
    }
}

pub struct InMemoryCollection {
    name: String,
    schema: CollectionSchema,
    store: Arc<RwLock<Store>>,
}

impl InMemoryCollection {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn matching<'a>(
        &self,
        store: &'a Store,
        filter: &QueryFilter,
    ) -> PersistenceResult<Vec<&'a Document>> {
        let filter = self.normalize_filter(filter);
        let mut matched = Vec::new();
        for document in store.documents(&self.name) {
            if filter.matches(document)? {
                matched.push(document);
            }
        }
        Ok(matched)
    }

    fn normalize_filter(&self, filter: &QueryFilter) -> QueryFilter {
        let mut expression = FilterExpression::new();
        for (field, comparisons) in filter.expression.iter() {
            let reference = is_reference(&self.schema, field);
            for comparison in comparisons {
                let mut comparison = comparison.clone();
                if reference {
                    canonicalize(&mut comparison.value);
                }
                expression.push(field.to_string(), comparison);
            }
        }
        QueryFilter {
            expression,
            search: filter.search.clone(),
        }
    }
}

#[async_trait]
impl DocumentCollection for InMemoryCollection {
    #[instrument(skip(self, query), fields(collection = %self.name))]
    async fn find(&self, query: &FindQuery) -> PersistenceResult<Vec<Document>> {
        let store = self.store.read().await;
        let mut matched = self.matching(&store, &query.filter)?;
        if !query.sort.is_empty() {
            matched.sort_by(|a, b| query.sort.compare(a, b));
        }

        let limit = query.limit.map_or(usize::MAX, |limit| limit as usize);
        Ok(matched
            .into_iter()
            .skip(query.skip as usize)
            .take(limit)
            .map(|document| {
                let mut projected = query.projection.apply(document.clone());
                store.expand(&mut projected, &query.populate);
                projected
            })
            .collect())
    }

    #[instrument(skip(self, populate), fields(collection = %self.name))]
    async fn find_by_id(
        &self,
        id: &str,
        populate: &[Populate],
    ) -> PersistenceResult<Option<Document>> {
        let id = parse_id(id)?;
        let store = self.store.read().await;
        let found = store
            .collections
            .get(&self.name)
            .and_then(|documents| documents.get(&id))
            .cloned();
        Ok(found.map(|mut document| {
            store.expand(&mut document, populate);
            document
        }))
    }

    #[instrument(skip(self, filter), fields(collection = %self.name))]
    async fn count_documents(&self, filter: &QueryFilter) -> PersistenceResult<u64> {
        let store = self.store.read().await;
        Ok(self.matching(&store, filter)?.len() as u64)
    }

    #[instrument(skip(self, data), fields(collection = %self.name))]
    async fn create(&self, mut data: Document) -> PersistenceResult<Document> {
        self.schema.apply_defaults(&mut data);
        self.schema.validate_new(&data)?;
        normalize_references(&self.schema, &mut data)?;

        let mut store = self.store.write().await;
        check_unique(&self.schema, store.collections.get(&self.name), &data, None)?;

        let id = Uuid::now_v7().to_string();
        let timestamp = store.next_timestamp();
        data.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        data.insert(CREATED_AT_FIELD.to_string(), Value::String(timestamp.clone()));
        data.insert(UPDATED_AT_FIELD.to_string(), Value::String(timestamp));
        data.insert(VERSION_FIELD.to_string(), Value::from(0));

        store
            .collections
            .entry(self.name.clone())
            .or_default()
            .insert(id.clone(), data.clone());

        tracing::debug!(id = %id, "Document stored");
        Ok(data)
    }

    #[instrument(skip(self, data, options), fields(collection = %self.name))]
    async fn find_by_id_and_update(
        &self,
        id: &str,
        mut data: Document,
        options: &UpdateOptions,
    ) -> PersistenceResult<Option<Document>> {
        let id = parse_id(id)?;
        for managed in [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD, VERSION_FIELD] {
            data.remove(managed);
        }
        if options.run_validators {
            self.schema.validate_changes(&data)?;
        }
        normalize_references(&self.schema, &mut data)?;

        let mut store = self.store.write().await;
        let exists = store
            .collections
            .get(&self.name)
            .is_some_and(|documents| documents.contains_key(&id));
        if !exists {
            return Ok(None);
        }
        check_unique(&self.schema, store.collections.get(&self.name), &data, Some(id.as_str()))?;

        let timestamp = store.next_timestamp();
        let Some(document) = store
            .collections
            .get_mut(&self.name)
            .and_then(|documents| documents.get_mut(&id))
        else {
            return Ok(None);
        };

        let before = document.clone();
        document.extend(data);
        document.insert(UPDATED_AT_FIELD.to_string(), Value::String(timestamp));
        let mut result = if options.return_new {
            document.clone()
        } else {
            before
        };

        store.expand(&mut result, &options.populate);
        Ok(Some(result))
    }

    #[instrument(skip(self), fields(collection = %self.name))]
    async fn find_by_id_and_delete(&self, id: &str) -> PersistenceResult<Option<Document>> {
        let id = parse_id(id)?;
        let mut store = self.store.write().await;
        Ok(store
            .collections
            .get_mut(&self.name)
            .and_then(|documents| documents.remove(&id)))
    }

    #[instrument(skip(self, filter), fields(collection = %self.name))]
    async fn delete_many(&self, filter: &QueryFilter) -> PersistenceResult<u64> {
        let mut store = self.store.write().await;
        let doomed: Vec<String> = self
            .matching(&store, filter)?
            .into_iter()
            .filter_map(|document| document.get(ID_FIELD).and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        if let Some(documents) = store.collections.get_mut(&self.name) {
            for id in &doomed {
                documents.remove(id);
            }
        }
        Ok(doomed.len() as u64)
    }
}
