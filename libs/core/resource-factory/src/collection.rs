//! Persistence adapter interface.
//!
//! A backend exposes each stored collection as a [`DocumentCollection`].
//! Documents are JSON objects keyed by `_id`; adapters classify their own
//! failures into [`PersistenceError`].

use async_trait::async_trait;
use query_features::{FindQuery, Populate, QueryExecutor, QueryFilter};

use crate::error::{PersistenceError, PersistenceResult};
use crate::Document;

/// Options for [`DocumentCollection::find_by_id_and_update`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Return the document as it is after the update
    pub return_new: bool,
    /// Enforce the collection schema on the updated fields
    pub run_validators: bool,
    pub populate: Vec<Populate>,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            return_new: true,
            run_validators: true,
            populate: Vec::new(),
        }
    }
}

impl UpdateOptions {
    pub fn with_populate(mut self, populate: Vec<Populate>) -> Self {
        self.populate = populate;
        self
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Documents matching the query's filter, sorted, projected and windowed
    async fn find(&self, query: &FindQuery) -> PersistenceResult<Vec<Document>>;

    async fn find_by_id(
        &self,
        id: &str,
        populate: &[Populate],
    ) -> PersistenceResult<Option<Document>>;

    async fn count_documents(&self, filter: &QueryFilter) -> PersistenceResult<u64>;

    /// Insert a document; the adapter assigns `_id` and timestamps
    async fn create(&self, data: Document) -> PersistenceResult<Document>;

    /// Set the given fields; `None` when no document has this id
    async fn find_by_id_and_update(
        &self,
        id: &str,
        data: Document,
        options: &UpdateOptions,
    ) -> PersistenceResult<Option<Document>>;

    /// Remove and return the document; `None` when no document has this id
    async fn find_by_id_and_delete(&self, id: &str) -> PersistenceResult<Option<Document>>;

    /// Number of documents removed
    async fn delete_many(&self, filter: &QueryFilter) -> PersistenceResult<u64>;
}

/// Runs pipeline queries against a [`DocumentCollection`]
pub struct CollectionExecutor<'a, C: ?Sized>(pub &'a C);

#[async_trait]
impl<C> QueryExecutor for CollectionExecutor<'_, C>
where
    C: DocumentCollection + ?Sized,
{
    type Item = Document;
    type Error = PersistenceError;

    async fn find(&self, query: &FindQuery) -> PersistenceResult<Vec<Document>> {
        self.0.find(query).await
    }

    async fn count(&self, filter: &QueryFilter) -> PersistenceResult<u64> {
        self.0.count_documents(filter).await
    }
}
