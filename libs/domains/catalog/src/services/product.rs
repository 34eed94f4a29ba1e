use query_features::{RequestParams, ResultEnvelope};
use resource_factory::{DeleteResponse, Document};
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use super::{Resource, to_document, with_slug};
use crate::config::CatalogConfig;
use crate::descriptors::CatalogDescriptors;
use crate::error::CatalogResult;
use crate::images::PRODUCT_IMAGES;
use crate::models::{CreateProduct, Product, UpdateProduct};

#[derive(Clone)]
pub struct ProductService {
    products: Resource,
    categories: Resource,
    subcategories: Resource,
    brands: Resource,
}

impl ProductService {
    pub fn new(descriptors: &CatalogDescriptors, config: Arc<CatalogConfig>) -> Self {
        Self {
            products: Resource::new(&descriptors.products, PRODUCT_IMAGES, &config),
            categories: Resource::new(&descriptors.categories, &[], &config),
            subcategories: Resource::new(&descriptors.subcategories, &[], &config),
            brands: Resource::new(&descriptors.brands, &[], &config),
        }
    }

    async fn ensure_references(
        &self,
        category: Option<&str>,
        subcategories: &[String],
        brand: Option<&str>,
    ) -> CatalogResult<()> {
        if let Some(category) = category {
            self.categories.ensure_exists(category).await?;
        }
        for subcategory in subcategories {
            self.subcategories.ensure_exists(subcategory).await?;
        }
        if let Some(brand) = brand {
            self.brands.ensure_exists(brand).await?;
        }
        Ok(())
    }

    /// The referenced category, subcategories and brand must exist
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: CreateProduct) -> CatalogResult<Product> {
        input.validate()?;
        self.ensure_references(
            Some(&input.category),
            &input.sub_category,
            input.brand.as_deref(),
        )
        .await?;
        let data = with_slug(to_document(&input)?, Some(&input.title))?;
        self.products.create(data).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> CatalogResult<Product> {
        self.products.get(id).await
    }

    /// Filtered listing, e.g. `price[gte]=100&sort=-sold&keyword=phone`
    #[instrument(skip(self, params))]
    pub async fn list(&self, params: &RequestParams) -> CatalogResult<ResultEnvelope<Document>> {
        self.products.list(params, None).await
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: UpdateProduct) -> CatalogResult<Product> {
        input.validate()?;
        self.ensure_references(
            input.category.as_deref(),
            input.sub_category.as_deref().unwrap_or_default(),
            input.brand.as_deref(),
        )
        .await?;
        let data = with_slug(to_document(&input)?, input.title.as_deref())?;
        self.products.update(id, data).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> CatalogResult<DeleteResponse> {
        self.products.delete(id).await
    }
}
