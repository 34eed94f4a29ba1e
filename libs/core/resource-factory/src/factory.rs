//! Generic CRUD over one [`EntityDescriptor`].

use query_features::{
    FilterExpression, QueryFilter, QueryOptions, QueryPipeline, RequestParams, ResultEnvelope,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

use crate::collection::{CollectionExecutor, UpdateOptions};
use crate::descriptor::EntityDescriptor;
use crate::error::{FactoryError, FactoryResult};
use crate::{Document, ID_FIELD};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteManyResponse {
    pub deleted_count: u64,
    pub message: String,
}

/// Create, read, list, update and delete for the resource described by the
/// descriptor. Holds no state between calls.
pub struct ResourceFactory {
    descriptor: Arc<EntityDescriptor>,
    options: QueryOptions,
}

impl ResourceFactory {
    pub fn new(descriptor: Arc<EntityDescriptor>) -> Self {
        Self::with_options(descriptor, QueryOptions::default())
    }

    pub fn with_options(descriptor: Arc<EntityDescriptor>, options: QueryOptions) -> Self {
        Self {
            descriptor,
            options,
        }
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    fn not_found(&self) -> FactoryError {
        FactoryError::NotFound(format!("{} not found", self.descriptor.display_name()))
    }

    fn report<T>(&self, operation: &'static str, result: FactoryResult<T>) -> FactoryResult<T> {
        result.inspect_err(|err| err.log(operation, self.descriptor.collection_name()))
    }

    /// Insert `data`; with expansions configured the stored document is
    /// re-read with related entities populated.
    #[instrument(skip(self, data), fields(collection = %self.descriptor.collection_name()))]
    pub async fn create_one(&self, data: Document) -> FactoryResult<Document> {
        let result = self.create_and_expand(data).await;
        self.report("create_one", result)
    }

    async fn create_and_expand(&self, data: Document) -> FactoryResult<Document> {
        let collection = self.descriptor.collection();
        let created = collection.create(data).await?;
        let id = document_id(&created)?;
        tracing::info!(id = %id, "{} created", self.descriptor.display_name());

        let expansions = self.descriptor.expansions();
        if expansions.is_empty() {
            return Ok(created);
        }

        match collection.find_by_id(&id, expansions).await? {
            Some(expanded) => Ok(expanded),
            None => {
                tracing::warn!(
                    id = %id,
                    collection = %self.descriptor.collection_name(),
                    "Created document missing on re-read"
                );
                Err(self.not_found())
            }
        }
    }

    #[instrument(skip(self), fields(collection = %self.descriptor.collection_name()))]
    pub async fn get_one(&self, id: &str) -> FactoryResult<Document> {
        let result: FactoryResult<Document> = async {
            self.descriptor
                .collection()
                .find_by_id(id, self.descriptor.expansions())
                .await?
                .ok_or_else(|| self.not_found())
        }
        .await;
        self.report("get_one", result)
    }

    /// Filtered, sorted, projected, paginated and searched listing
    #[instrument(skip(self, params), fields(collection = %self.descriptor.collection_name()))]
    pub async fn get_all(&self, params: &RequestParams) -> FactoryResult<ResultEnvelope<Document>> {
        let result = self.list(params, FilterExpression::new()).await;
        self.report("get_all", result)
    }

    /// [`ResourceFactory::get_all`] restricted to documents matching `scope`
    #[instrument(skip(self, params, scope), fields(collection = %self.descriptor.collection_name()))]
    pub async fn get_all_scoped(
        &self,
        params: &RequestParams,
        scope: FilterExpression,
    ) -> FactoryResult<ResultEnvelope<Document>> {
        let result = self.list(params, scope).await;
        self.report("get_all_scoped", result)
    }

    async fn list(
        &self,
        params: &RequestParams,
        scope: FilterExpression,
    ) -> FactoryResult<ResultEnvelope<Document>> {
        let descriptor = &self.descriptor;
        let envelope = QueryPipeline::new(params, &self.options)
            .with_schema(descriptor.query_schema().clone())
            .scope(scope)
            .filter()?
            .sort()
            .limit_fields()?
            .paginate()
            .search(descriptor.search_fields())
            .populate_all(descriptor.expansions().iter().cloned())
            .execute(&CollectionExecutor(descriptor.collection()))
            .await?;
        tracing::debug!(total_count = envelope.total_count, "Listed documents");
        Ok(envelope)
    }

    /// Set the fields in `data`, validating them; returns the updated
    /// document with expansions.
    #[instrument(skip(self, data), fields(collection = %self.descriptor.collection_name()))]
    pub async fn update_one(&self, id: &str, data: Document) -> FactoryResult<Document> {
        let result: FactoryResult<Document> = async {
            let options = UpdateOptions::default().with_populate(self.descriptor.expansions().to_vec());
            let updated = self
                .descriptor
                .collection()
                .find_by_id_and_update(id, data, &options)
                .await?
                .ok_or_else(|| self.not_found())?;
            tracing::info!(id, "{} updated", self.descriptor.display_name());
            Ok(updated)
        }
        .await;
        self.report("update_one", result)
    }

    #[instrument(skip(self), fields(collection = %self.descriptor.collection_name()))]
    pub async fn delete_one(&self, id: &str) -> FactoryResult<DeleteResponse> {
        let result: FactoryResult<DeleteResponse> = async {
            self.descriptor
                .collection()
                .find_by_id_and_delete(id)
                .await?
                .ok_or_else(|| self.not_found())?;
            tracing::info!(id, "{} deleted", self.descriptor.display_name());
            Ok(DeleteResponse {
                message: format!("{} deleted successfully", self.descriptor.display_name()),
            })
        }
        .await;
        self.report("delete_one", result)
    }

    #[instrument(skip(self, filter), fields(collection = %self.descriptor.collection_name()))]
    pub async fn delete_many(
        &self,
        filter: impl Into<QueryFilter>,
    ) -> FactoryResult<DeleteManyResponse> {
        let filter = filter.into();
        let result: FactoryResult<DeleteManyResponse> = async {
            let deleted_count = self.descriptor.collection().delete_many(&filter).await?;
            tracing::info!(deleted_count, "{} deleted", self.descriptor.plural_name());
            Ok(DeleteManyResponse {
                deleted_count,
                message: format!(
                    "{} {} deleted successfully",
                    deleted_count,
                    self.descriptor.plural_name()
                ),
            })
        }
        .await;
        self.report("delete_many", result)
    }

    #[instrument(skip(self, filter), fields(collection = %self.descriptor.collection_name()))]
    pub async fn count(&self, filter: impl Into<QueryFilter>) -> FactoryResult<u64> {
        let filter = filter.into();
        let result = self
            .descriptor
            .collection()
            .count_documents(&filter)
            .await
            .map_err(FactoryError::from);
        self.report("count", result)
    }

    pub async fn exists(&self, filter: impl Into<QueryFilter>) -> FactoryResult<bool> {
        Ok(self.count(filter).await? > 0)
    }
}

impl Clone for ResourceFactory {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            options: self.options,
        }
    }
}

fn document_id(document: &Document) -> FactoryResult<String> {
    document
        .get(ID_FIELD)
        .and_then(|id| id.as_str())
        .map(str::to_string)
        .ok_or_else(|| FactoryError::Internal("stored document has no string _id".to_string()))
}
