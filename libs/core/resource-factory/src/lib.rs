//! Generic create/read/update/delete over document collections.
//!
//! A [`ResourceFactory`] is parameterized by an [`EntityDescriptor`] and talks
//! to storage only through the [`DocumentCollection`] trait. Two adapters ship
//! with the crate:
//!
//! - [`InMemoryDatabase`]: an in-process store used by tests and embedding
//! - `mongodb::MongoDocumentCollection` (feature `mongodb`)
//!
//! ```ignore
//! use resource_factory::{EntityDescriptor, InMemoryDatabase, ResourceFactory};
//!
//! let db = InMemoryDatabase::new();
//! let brands = Arc::new(db.collection("brands", schema));
//! let factory = ResourceFactory::new(EntityDescriptor::builder("brands", "Brand", brands).build());
//! let page = factory.get_all(&RequestParams::from_query_string("page=2&limit=5")).await?;
//! ```

pub mod collection;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongodb;
pub mod schema;

/// Documents cross the adapter boundary as JSON objects
pub type Document = serde_json::Map<String, serde_json::Value>;

pub use query_features::ID_FIELD;
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

pub use collection::{CollectionExecutor, DocumentCollection, UpdateOptions};
pub use descriptor::{EntityDescriptor, EntityDescriptorBuilder};
pub use error::{
    ErrorKind, FactoryError, FactoryResult, GENERIC_ERROR_MESSAGE, PersistenceError,
    PersistenceResult,
};
pub use factory::{DeleteManyResponse, DeleteResponse, ResourceFactory};
pub use memory::{InMemoryCollection, InMemoryDatabase};
pub use schema::{CollectionSchema, FieldRule};
