//! MongoDB implementation of DocumentCollection

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, Bson, DateTime, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
};
use query_features::{FindQuery, Populate, QueryFilter, VERSION_FIELD};
use serde_json::Value;
use std::collections::HashMap;
use tracing::instrument;

use super::convert::{
    filter_document, parse_object_id, populate_projection, projection_document, referenced_ids,
    sort_document, to_bson_document, to_json_document,
};
use crate::collection::{DocumentCollection, UpdateOptions};
use crate::error::{PersistenceError, PersistenceResult};
use crate::schema::CollectionSchema;
use crate::{CREATED_AT_FIELD, Document, ID_FIELD, UPDATED_AT_FIELD};

const DUPLICATE_KEY_CODE: i32 = 11000;
const DOCUMENT_VALIDATION_CODE: i32 = 121;

/// Field named in a duplicate key message such as
/// `E11000 duplicate key error collection: db.brands index: name_1 dup key: { name: "Acme" }`
fn duplicate_field(message: &str) -> String {
    message
        .split_once("dup key: {")
        .and_then(|(_, rest)| rest.split_once(':'))
        .map(|(field, _)| field.trim().trim_matches('"').to_string())
        .filter(|field| !field.is_empty())
        .unwrap_or_else(|| "value".to_string())
}

fn classify_code(code: i32, message: &str) -> Option<PersistenceError> {
    match code {
        DUPLICATE_KEY_CODE => Some(PersistenceError::DuplicateKey {
            field: duplicate_field(message),
            message: message.to_string(),
        }),
        DOCUMENT_VALIDATION_CODE => Some(PersistenceError::Validation(message.to_string())),
        _ => None,
    }
}

impl From<MongoError> for PersistenceError {
    fn from(err: MongoError) -> Self {
        let classified = match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write)) => {
                classify_code(write.code, &write.message)
            }
            ErrorKind::Command(command) => classify_code(command.code, &command.message),
            _ => None,
        };
        classified.unwrap_or_else(|| PersistenceError::Backend(err.to_string()))
    }
}

/// One MongoDB collection exposed as a [`DocumentCollection`]
pub struct MongoDocumentCollection {
    database: Database,
    collection: Collection<bson::Document>,
    schema: CollectionSchema,
}

impl MongoDocumentCollection {
    pub fn new(database: &Database, name: &str, schema: CollectionSchema) -> Self {
        Self {
            database: database.clone(),
            collection: database.collection::<bson::Document>(name),
            schema,
        }
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<bson::Document> {
        &self.collection
    }

    /// Create one unique index per unique field of the schema
    pub async fn init_indexes(&self) -> PersistenceResult<()> {
        let indexes: Vec<IndexModel> = self
            .schema
            .unique_fields()
            .map(|field| {
                let mut keys = bson::Document::new();
                keys.insert(field, 1);
                IndexModel::builder()
                    .keys(keys)
                    .options(
                        IndexOptions::builder()
                            .unique(true)
                            .name(format!("idx_{}_unique", field))
                            .build(),
                    )
                    .build()
            })
            .collect();

        if indexes.is_empty() {
            return Ok(());
        }

        self.collection.create_indexes(indexes).await?;
        tracing::info!(collection = %self.collection.name(), "Unique indexes created");
        Ok(())
    }

    /// Replace reference ids with the referenced documents, the way
    /// `populate` does: one `$in` query per expansion.
    async fn expand(
        &self,
        documents: &mut [Document],
        expansions: &[Populate],
    ) -> PersistenceResult<()> {
        for expansion in expansions {
            let ids = referenced_ids(documents, &expansion.path);
            if ids.is_empty() {
                continue;
            }

            let options = FindOptions::builder()
                .projection(populate_projection(expansion))
                .build();
            let related: Vec<bson::Document> = self
                .database
                .collection::<bson::Document>(&expansion.from)
                .find(doc! { ID_FIELD: { "$in": ids } })
                .with_options(options)
                .await?
                .try_collect()
                .await?;

            let by_id: HashMap<String, Value> = related
                .into_iter()
                .map(to_json_document)
                .filter_map(|document| {
                    let id = document.get(ID_FIELD)?.as_str()?.to_string();
                    Some((id, Value::Object(document)))
                })
                .collect();

            for document in documents.iter_mut() {
                let Some(stored) = document.get_mut(&expansion.path) else {
                    continue;
                };
                *stored = match stored.take() {
                    Value::String(id) => by_id.get(&id).cloned().unwrap_or(Value::Null),
                    Value::Array(ids) => Value::Array(
                        ids.iter()
                            .filter_map(Value::as_str)
                            .filter_map(|id| by_id.get(id).cloned())
                            .collect(),
                    ),
                    other => other,
                };
            }
        }
        Ok(())
    }

    async fn expand_one(
        &self,
        document: Option<bson::Document>,
        expansions: &[Populate],
    ) -> PersistenceResult<Option<Document>> {
        let Some(document) = document else {
            return Ok(None);
        };
        let mut documents = [to_json_document(document)];
        self.expand(&mut documents, expansions).await?;
        let [document] = documents;
        Ok(Some(document))
    }
}

#[async_trait]
impl DocumentCollection for MongoDocumentCollection {
    #[instrument(skip(self, query), fields(collection = %self.collection.name()))]
    async fn find(&self, query: &FindQuery) -> PersistenceResult<Vec<Document>> {
        let filter = filter_document(&self.schema, &query.filter)?;

        let mut options = FindOptions::default();
        options.sort = sort_document(&query.sort);
        options.skip = Some(query.skip);
        options.limit = query.limit.map(|limit| limit as i64);
        options.projection = Some(projection_document(&query.projection));

        let found: Vec<bson::Document> = self
            .collection
            .find(filter)
            .with_options(options)
            .await?
            .try_collect()
            .await?;

        let mut documents: Vec<Document> = found.into_iter().map(to_json_document).collect();
        self.expand(&mut documents, &query.populate).await?;
        Ok(documents)
    }

    #[instrument(skip(self, populate), fields(collection = %self.collection.name()))]
    async fn find_by_id(
        &self,
        id: &str,
        populate: &[Populate],
    ) -> PersistenceResult<Option<Document>> {
        let oid = parse_object_id(id)?;
        let found = self.collection.find_one(doc! { ID_FIELD: oid }).await?;
        self.expand_one(found, populate).await
    }

    #[instrument(skip(self, filter), fields(collection = %self.collection.name()))]
    async fn count_documents(&self, filter: &QueryFilter) -> PersistenceResult<u64> {
        let filter = filter_document(&self.schema, filter)?;
        Ok(self.collection.count_documents(filter).await?)
    }

    #[instrument(skip(self, data), fields(collection = %self.collection.name()))]
    async fn create(&self, mut data: Document) -> PersistenceResult<Document> {
        data.remove(ID_FIELD);
        self.schema.apply_defaults(&mut data);
        self.schema.validate_new(&data)?;

        let mut document = to_bson_document(&self.schema, &data)?;
        let now = DateTime::now();
        document.insert(CREATED_AT_FIELD, now);
        document.insert(UPDATED_AT_FIELD, now);
        document.insert(VERSION_FIELD, 0_i32);

        let inserted = self.collection.insert_one(&document).await?;
        document.insert(ID_FIELD, inserted.inserted_id);

        let created = to_json_document(document);
        tracing::info!(id = ?created.get(ID_FIELD), "Document inserted");
        Ok(created)
    }

    #[instrument(skip(self, data, options), fields(collection = %self.collection.name()))]
    async fn find_by_id_and_update(
        &self,
        id: &str,
        mut data: Document,
        options: &UpdateOptions,
    ) -> PersistenceResult<Option<Document>> {
        let oid = parse_object_id(id)?;
        for managed in [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD, VERSION_FIELD] {
            data.remove(managed);
        }
        if options.run_validators {
            self.schema.validate_changes(&data)?;
        }

        let mut changes = to_bson_document(&self.schema, &data)?;
        changes.insert(UPDATED_AT_FIELD, Bson::DateTime(DateTime::now()));

        let return_document = if options.return_new {
            ReturnDocument::After
        } else {
            ReturnDocument::Before
        };
        let updated = self
            .collection
            .find_one_and_update(doc! { ID_FIELD: oid }, doc! { "$set": changes })
            .with_options(
                FindOneAndUpdateOptions::builder()
                    .return_document(return_document)
                    .build(),
            )
            .await?;

        self.expand_one(updated, &options.populate).await
    }

    #[instrument(skip(self), fields(collection = %self.collection.name()))]
    async fn find_by_id_and_delete(&self, id: &str) -> PersistenceResult<Option<Document>> {
        let oid = parse_object_id(id)?;
        let deleted = self
            .collection
            .find_one_and_delete(doc! { ID_FIELD: oid })
            .await?;
        Ok(deleted.map(to_json_document))
    }

    #[instrument(skip(self, filter), fields(collection = %self.collection.name()))]
    async fn delete_many(&self, filter: &QueryFilter) -> PersistenceResult<u64> {
        let filter = filter_document(&self.schema, filter)?;
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }
}
