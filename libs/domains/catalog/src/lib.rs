//! Catalog Domain
//!
//! Categories, subcategories, brands and products over the generic
//! resource factory.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Services   │  ← DTO validation, slugs, referential rules, image URLs
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Factory   │  ← generic CRUD + query pipeline (resource_factory)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Collections │  ← in-memory or MongoDB adapter
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_catalog::{Catalog, CatalogConfig, CreateCategory};
//! use query_features::RequestParams;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::in_memory(CatalogConfig::new());
//! let phones = catalog
//!     .categories
//!     .create(CreateCategory { name: "Phones".into(), image: None })
//!     .await?;
//! let page = catalog
//!     .subcategories
//!     .list_for_category(&phones.id, &RequestParams::from_query_string("sort=name"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod images;
pub mod models;
pub mod schemas;
pub mod services;
pub mod slug;

pub use catalog::Catalog;
pub use config::CatalogConfig;
pub use descriptors::CatalogDescriptors;
pub use error::{CatalogError, CatalogResult};
pub use models::{
    Brand, Category, CreateBrand, CreateCategory, CreateProduct, CreateSubCategory, Product,
    Reference, RelatedSummary, SubCategory, UpdateBrand, UpdateCategory, UpdateProduct,
    UpdateSubCategory,
};
pub use services::{BrandService, CategoryService, ProductService, SubCategoryService};
pub use slug::slugify;
