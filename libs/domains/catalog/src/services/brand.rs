use query_features::{RequestParams, ResultEnvelope};
use resource_factory::{DeleteResponse, Document};
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use super::{Resource, to_document, with_slug};
use crate::config::CatalogConfig;
use crate::descriptors::CatalogDescriptors;
use crate::error::{CatalogError, CatalogResult};
use crate::images::BRAND_IMAGES;
use crate::models::{Brand, CreateBrand, UpdateBrand};

#[derive(Clone)]
pub struct BrandService {
    brands: Resource,
    products: Resource,
}

impl BrandService {
    pub fn new(descriptors: &CatalogDescriptors, config: Arc<CatalogConfig>) -> Self {
        Self {
            brands: Resource::new(&descriptors.brands, BRAND_IMAGES, &config),
            products: Resource::new(&descriptors.products, &[], &config),
        }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateBrand) -> CatalogResult<Brand> {
        input.validate()?;
        let data = with_slug(to_document(&input)?, Some(&input.name))?;
        self.brands.create(data).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> CatalogResult<Brand> {
        self.brands.get(id).await
    }

    #[instrument(skip(self, params))]
    pub async fn list(&self, params: &RequestParams) -> CatalogResult<ResultEnvelope<Document>> {
        self.brands.list(params, None).await
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: UpdateBrand) -> CatalogResult<Brand> {
        input.validate()?;
        let data = with_slug(to_document(&input)?, input.name.as_deref())?;
        self.brands.update(id, data).await
    }

    /// Refused while products still reference the brand
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> CatalogResult<DeleteResponse> {
        let products = self.products.count_referencing("brand", id).await?;
        if products > 0 {
            return Err(CatalogError::Conflict(format!(
                "Brand is still referenced by {} products",
                products
            )));
        }
        self.brands.delete(id).await
    }
}
