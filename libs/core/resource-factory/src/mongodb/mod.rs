//! MongoDB adapter (feature `mongodb`).
//!
//! Reference fields and `_id` are stored as ObjectIds, timestamps as BSON
//! dates. Uniqueness is enforced by the indexes created with
//! [`MongoDocumentCollection::init_indexes`].

mod collection;
mod connect;
mod convert;

pub use collection::MongoDocumentCollection;
pub use connect::{connect, connect_database, ping};
