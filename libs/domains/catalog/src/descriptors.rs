use query_features::Populate;
use resource_factory::{CollectionSchema, DocumentCollection, EntityDescriptor};
use std::sync::Arc;

use crate::schemas::{brand_schema, category_schema, product_schema, subcategory_schema};

pub const CATEGORIES: &str = "categories";
pub const SUBCATEGORIES: &str = "subcategories";
pub const BRANDS: &str = "brands";
pub const PRODUCTS: &str = "products";

/// Descriptors for the four catalog resources
#[derive(Debug, Clone)]
pub struct CatalogDescriptors {
    pub categories: Arc<EntityDescriptor>,
    pub subcategories: Arc<EntityDescriptor>,
    pub brands: Arc<EntityDescriptor>,
    pub products: Arc<EntityDescriptor>,
}

impl CatalogDescriptors {
    /// Build the descriptors over collections produced by `open(name, schema)`
    pub fn new<F>(mut open: F) -> Self
    where
        F: FnMut(&str, CollectionSchema) -> Arc<dyn DocumentCollection>,
    {
        let name_only = |path: &str, from: &str| Populate::new(path, from).select(["name"]);

        let categories = EntityDescriptor::builder(
            CATEGORIES,
            "Category",
            open(CATEGORIES, category_schema()),
        )
        .plural_name("Categories")
        .schema(category_schema())
        .build();

        let subcategories = EntityDescriptor::builder(
            SUBCATEGORIES,
            "SubCategory",
            open(SUBCATEGORIES, subcategory_schema()),
        )
        .plural_name("SubCategories")
        .expand(name_only("category", CATEGORIES))
        .schema(subcategory_schema())
        .build();

        let brands = EntityDescriptor::builder(BRANDS, "Brand", open(BRANDS, brand_schema()))
            .schema(brand_schema())
            .build();

        let products =
            EntityDescriptor::builder(PRODUCTS, "Product", open(PRODUCTS, product_schema()))
                .expand(name_only("category", CATEGORIES))
                .expand(name_only("subCategory", SUBCATEGORIES))
                .expand(name_only("brand", BRANDS))
                .search_fields(["title", "description"])
                .schema(product_schema())
                .build();

        Self {
            categories,
            subcategories,
            brands,
            products,
        }
    }
}
