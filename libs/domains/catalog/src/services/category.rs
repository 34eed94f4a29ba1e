use query_features::{RequestParams, ResultEnvelope};
use resource_factory::{DeleteResponse, Document};
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use super::{Resource, to_document, with_slug};
use crate::config::CatalogConfig;
use crate::descriptors::CatalogDescriptors;
use crate::error::{CatalogError, CatalogResult};
use crate::images::CATEGORY_IMAGES;
use crate::models::{Category, CreateCategory, UpdateCategory};

#[derive(Clone)]
pub struct CategoryService {
    categories: Resource,
    subcategories: Resource,
    products: Resource,
}

impl CategoryService {
    pub fn new(descriptors: &CatalogDescriptors, config: Arc<CatalogConfig>) -> Self {
        Self {
            categories: Resource::new(&descriptors.categories, CATEGORY_IMAGES, &config),
            subcategories: Resource::new(&descriptors.subcategories, &[], &config),
            products: Resource::new(&descriptors.products, &[], &config),
        }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateCategory) -> CatalogResult<Category> {
        input.validate()?;
        let data = with_slug(to_document(&input)?, Some(&input.name))?;
        self.categories.create(data).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> CatalogResult<Category> {
        self.categories.get(id).await
    }

    #[instrument(skip(self, params))]
    pub async fn list(&self, params: &RequestParams) -> CatalogResult<ResultEnvelope<Document>> {
        self.categories.list(params, None).await
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: UpdateCategory) -> CatalogResult<Category> {
        input.validate()?;
        let data = with_slug(to_document(&input)?, input.name.as_deref())?;
        self.categories.update(id, data).await
    }

    /// Refused while subcategories or products still reference the category
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> CatalogResult<DeleteResponse> {
        let subcategories = self.subcategories.count_referencing("category", id).await?;
        if subcategories > 0 {
            return Err(CatalogError::Conflict(format!(
                "Category still has {} subcategories",
                subcategories
            )));
        }

        let products = self.products.count_referencing("category", id).await?;
        if products > 0 {
            return Err(CatalogError::Conflict(format!(
                "Category still has {} products",
                products
            )));
        }

        self.categories.delete(id).await
    }
}
