use query_features::{Populate, Schema};
use std::fmt;
use std::sync::Arc;

use crate::collection::DocumentCollection;
use crate::schema::CollectionSchema;

/// Static configuration of one resource: where it lives, what it is called,
/// what to expand and what to search.
///
/// Built once at startup and shared read-only.
#[derive(Clone)]
pub struct EntityDescriptor {
    collection: Arc<dyn DocumentCollection>,
    collection_name: String,
    display_name: String,
    plural_name: String,
    expansions: Vec<Populate>,
    search_fields: Vec<String>,
    schema: CollectionSchema,
    query_schema: Schema,
}

impl EntityDescriptor {
    pub fn builder(
        collection_name: impl Into<String>,
        display_name: impl Into<String>,
        collection: Arc<dyn DocumentCollection>,
    ) -> EntityDescriptorBuilder {
        let display_name = display_name.into();
        EntityDescriptorBuilder {
            collection,
            collection_name: collection_name.into(),
            plural_name: format!("{}s", display_name),
            display_name,
            expansions: Vec::new(),
            search_fields: vec!["name".to_string()],
            schema: CollectionSchema::default(),
        }
    }

    pub fn collection(&self) -> &dyn DocumentCollection {
        self.collection.as_ref()
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Singular name used in messages, e.g. `Category`
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn plural_name(&self) -> &str {
        &self.plural_name
    }

    pub fn expansions(&self) -> &[Populate] {
        &self.expansions
    }

    pub fn search_fields(&self) -> &[String] {
        &self.search_fields
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    pub fn query_schema(&self) -> &Schema {
        &self.query_schema
    }
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("collection_name", &self.collection_name)
            .field("display_name", &self.display_name)
            .field("expansions", &self.expansions)
            .field("search_fields", &self.search_fields)
            .finish_non_exhaustive()
    }
}

pub struct EntityDescriptorBuilder {
    collection: Arc<dyn DocumentCollection>,
    collection_name: String,
    display_name: String,
    plural_name: String,
    expansions: Vec<Populate>,
    search_fields: Vec<String>,
    schema: CollectionSchema,
}

impl EntityDescriptorBuilder {
    pub fn plural_name(mut self, plural: impl Into<String>) -> Self {
        self.plural_name = plural.into();
        self
    }

    pub fn expand(mut self, expansion: Populate) -> Self {
        self.expansions.push(expansion);
        self
    }

    /// Replaces the default `["name"]`
    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn schema(mut self, schema: CollectionSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn build(self) -> Arc<EntityDescriptor> {
        let query_schema = self.schema.query_schema();
        Arc::new(EntityDescriptor {
            collection: self.collection,
            collection_name: self.collection_name,
            display_name: self.display_name,
            plural_name: self.plural_name,
            expansions: self.expansions,
            search_fields: self.search_fields,
            schema: self.schema,
            query_schema,
        })
    }
}
