use resource_factory::{DocumentCollection, InMemoryDatabase};
use std::sync::Arc;

use crate::config::CatalogConfig;
use crate::descriptors::CatalogDescriptors;
use crate::services::{BrandService, CategoryService, ProductService, SubCategoryService};

/// The four catalog services wired over one store
#[derive(Clone)]
pub struct Catalog {
    pub categories: CategoryService,
    pub subcategories: SubCategoryService,
    pub brands: BrandService,
    pub products: ProductService,
    config: Arc<CatalogConfig>,
}

impl Catalog {
    pub fn new(descriptors: &CatalogDescriptors, config: CatalogConfig) -> Self {
        let config = Arc::new(config);
        Self {
            categories: CategoryService::new(descriptors, Arc::clone(&config)),
            subcategories: SubCategoryService::new(descriptors, Arc::clone(&config)),
            brands: BrandService::new(descriptors, Arc::clone(&config)),
            products: ProductService::new(descriptors, Arc::clone(&config)),
            config,
        }
    }

    /// Catalog over a fresh in-process store
    pub fn in_memory(config: CatalogConfig) -> Self {
        let db = InMemoryDatabase::new();
        let descriptors = CatalogDescriptors::new(|name, schema| {
            Arc::new(db.collection(name, schema)) as Arc<dyn DocumentCollection>
        });
        Self::new(&descriptors, config)
    }

    /// Connect to MongoDB, ping it and create the unique indexes
    #[cfg(feature = "mongodb")]
    pub async fn connect(
        mongo: &core_config::mongodb::MongoConfig,
        config: CatalogConfig,
    ) -> crate::error::CatalogResult<Self> {
        use resource_factory::{FactoryError, mongodb::MongoDocumentCollection};

        let database = resource_factory::mongodb::connect_database(mongo)
            .await
            .map_err(FactoryError::from)?;

        let mut collections = Vec::new();
        let descriptors = CatalogDescriptors::new(|name, schema| {
            let collection = Arc::new(MongoDocumentCollection::new(&database, name, schema));
            collections.push(Arc::clone(&collection));
            collection as Arc<dyn DocumentCollection>
        });

        for collection in &collections {
            collection.init_indexes().await.map_err(FactoryError::from)?;
        }
        tracing::info!(database = %mongo.database, "Catalog connected");

        Ok(Self::new(&descriptors, config))
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }
}
