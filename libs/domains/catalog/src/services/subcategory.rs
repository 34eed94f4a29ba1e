use query_features::{FilterExpression, RequestParams, ResultEnvelope};
use resource_factory::{DeleteResponse, Document};
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use super::{Resource, to_document, with_slug};
use crate::config::CatalogConfig;
use crate::descriptors::CatalogDescriptors;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{CreateSubCategory, SubCategory, UpdateSubCategory};

#[derive(Clone)]
pub struct SubCategoryService {
    subcategories: Resource,
    categories: Resource,
    products: Resource,
}

impl SubCategoryService {
    pub fn new(descriptors: &CatalogDescriptors, config: Arc<CatalogConfig>) -> Self {
        Self {
            subcategories: Resource::new(&descriptors.subcategories, &[], &config),
            categories: Resource::new(&descriptors.categories, &[], &config),
            products: Resource::new(&descriptors.products, &[], &config),
        }
    }

    /// The referenced category must exist
    #[instrument(skip(self, input), fields(name = %input.name, category = %input.category))]
    pub async fn create(&self, input: CreateSubCategory) -> CatalogResult<SubCategory> {
        input.validate()?;
        self.categories.ensure_exists(&input.category).await?;
        let data = with_slug(to_document(&input)?, Some(&input.name))?;
        self.subcategories.create(data).await
    }

    /// Create under `category_id`, ignoring any category in the input
    pub async fn create_for_category(
        &self,
        category_id: &str,
        mut input: CreateSubCategory,
    ) -> CatalogResult<SubCategory> {
        input.category = category_id.to_string();
        self.create(input).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> CatalogResult<SubCategory> {
        self.subcategories.get(id).await
    }

    #[instrument(skip(self, params))]
    pub async fn list(&self, params: &RequestParams) -> CatalogResult<ResultEnvelope<Document>> {
        self.subcategories.list(params, None).await
    }

    /// Subcategories of one category; the category filter cannot be
    /// overridden by request parameters
    #[instrument(skip(self, params))]
    pub async fn list_for_category(
        &self,
        category_id: &str,
        params: &RequestParams,
    ) -> CatalogResult<ResultEnvelope<Document>> {
        let scope = FilterExpression::new().eq("category", category_id);
        self.subcategories.list(params, Some(scope)).await
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: UpdateSubCategory) -> CatalogResult<SubCategory> {
        input.validate()?;
        if let Some(category) = input.category.as_deref() {
            self.categories.ensure_exists(category).await?;
        }
        let data = with_slug(to_document(&input)?, input.name.as_deref())?;
        self.subcategories.update(id, data).await
    }

    /// Refused while products still reference the subcategory
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> CatalogResult<DeleteResponse> {
        let products = self.products.count_referencing("subCategory", id).await?;
        if products > 0 {
            return Err(CatalogError::Conflict(format!(
                "SubCategory is still referenced by {} products",
                products
            )));
        }
        self.subcategories.delete(id).await
    }
}
