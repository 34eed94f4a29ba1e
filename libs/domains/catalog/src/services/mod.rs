//! Typed services over the resource factory, one per catalog resource.
//!
//! Services validate input DTOs, derive slugs, enforce referential rules and
//! turn stored documents into domain models with public image URLs. Listings
//! stay as documents because `fields` may project any subset of a model.

mod brand;
mod category;
mod product;
mod subcategory;

pub use brand::BrandService;
pub use category::CategoryService;
pub use product::ProductService;
pub use subcategory::SubCategoryService;

use query_features::{FilterExpression, RequestParams, ResultEnvelope};
use resource_factory::{DeleteResponse, Document, EntityDescriptor, ResourceFactory};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::images::{ImageField, resolve_images};
use crate::slug::slugify;

/// Factory for one resource plus how its documents are presented
#[derive(Clone)]
pub(crate) struct Resource {
    factory: ResourceFactory,
    images: &'static [ImageField],
    config: Arc<CatalogConfig>,
}

impl Resource {
    pub(crate) fn new(
        descriptor: &Arc<EntityDescriptor>,
        images: &'static [ImageField],
        config: &Arc<CatalogConfig>,
    ) -> Self {
        Self {
            factory: ResourceFactory::with_options(Arc::clone(descriptor), config.query),
            images,
            config: Arc::clone(config),
        }
    }

    fn present(&self, mut document: Document) -> Document {
        resolve_images(&mut document, self.images, &self.config);
        document
    }

    fn decode<T: DeserializeOwned>(&self, document: Document) -> CatalogResult<T> {
        Ok(serde_json::from_value(Value::Object(self.present(document)))?)
    }

    pub(crate) async fn create<T: DeserializeOwned>(&self, data: Document) -> CatalogResult<T> {
        let created = self.factory.create_one(data).await?;
        self.decode(created)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, id: &str) -> CatalogResult<T> {
        let found = self.factory.get_one(id).await?;
        self.decode(found)
    }

    pub(crate) async fn list(
        &self,
        params: &RequestParams,
        scope: Option<FilterExpression>,
    ) -> CatalogResult<ResultEnvelope<Document>> {
        let envelope = match scope {
            Some(scope) => self.factory.get_all_scoped(params, scope).await?,
            None => self.factory.get_all(params).await?,
        };
        Ok(envelope.map(|document| self.present(document)))
    }

    pub(crate) async fn update<T: DeserializeOwned>(
        &self,
        id: &str,
        data: Document,
    ) -> CatalogResult<T> {
        let updated = self.factory.update_one(id, data).await?;
        self.decode(updated)
    }

    pub(crate) async fn delete(&self, id: &str) -> CatalogResult<DeleteResponse> {
        Ok(self.factory.delete_one(id).await?)
    }

    /// Number of documents whose `field` references `id`
    pub(crate) async fn count_referencing(&self, field: &str, id: &str) -> CatalogResult<u64> {
        Ok(self
            .factory
            .count(FilterExpression::new().eq(field, id))
            .await?)
    }

    /// Fails with NotFound unless a document with `id` exists
    pub(crate) async fn ensure_exists(&self, id: &str) -> CatalogResult<()> {
        self.factory.get_one(id).await?;
        Ok(())
    }
}

/// Serialize a DTO into the document handed to the factory
pub(crate) fn to_document<T: Serialize>(input: &T) -> CatalogResult<Document> {
    match serde_json::to_value(input)? {
        Value::Object(document) => Ok(document),
        other => Err(CatalogError::Internal(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Set `slug` from `source` when present; a name with nothing sluggable is
/// rejected
pub(crate) fn with_slug(
    mut document: Document,
    source: Option<&str>,
) -> CatalogResult<Document> {
    if let Some(source) = source {
        let slug = slugify(source);
        if slug.is_empty() {
            return Err(CatalogError::Validation(format!(
                "'{}' does not produce a valid slug",
                source
            )));
        }
        document.insert("slug".to_string(), Value::String(slug));
    }
    Ok(document)
}
