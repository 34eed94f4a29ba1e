//! Collection schemas enforced by the persistence adapters.

use resource_factory::{CollectionSchema, FieldRule};

fn name_rule() -> FieldRule {
    FieldRule::string().required().unique().length(3, 32)
}

pub fn category_schema() -> CollectionSchema {
    CollectionSchema::new()
        .field("name", name_rule())
        .field("slug", FieldRule::string().required().unique())
        .field("image", FieldRule::string())
}

pub fn subcategory_schema() -> CollectionSchema {
    CollectionSchema::new()
        .field("name", name_rule())
        .field("slug", FieldRule::string().required().unique())
        .field("category", FieldRule::reference().required())
}

pub fn brand_schema() -> CollectionSchema {
    CollectionSchema::new()
        .field("name", name_rule())
        .field("slug", FieldRule::string().required().unique())
        .field("image", FieldRule::string())
}

pub fn product_schema() -> CollectionSchema {
    CollectionSchema::new()
        .field("title", FieldRule::string().required().length(3, 100))
        .field("slug", FieldRule::string().required())
        .field("description", FieldRule::string().required().min_length(30))
        .field("quantity", FieldRule::number().required())
        .field("sold", FieldRule::number().default_value(0))
        .field("price", FieldRule::number().required())
        .field("priceAfterDiscount", FieldRule::number())
        .field("colors", FieldRule::string().many())
        .field("imageCover", FieldRule::string().required())
        .field("images", FieldRule::string().many())
        .field("category", FieldRule::reference().required())
        .field("subCategory", FieldRule::reference().many())
        .field("brand", FieldRule::reference())
        .field("ratingAverage", FieldRule::number().range(1.0, 5.0))
        .field("ratingQuantity", FieldRule::number().default_value(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_features::FieldKind;

    #[test]
    fn test_product_schema_drives_numeric_coercion() {
        let schema = product_schema().query_schema();
        assert_eq!(schema.kind_of("price"), Some(FieldKind::Number));
        assert_eq!(schema.kind_of("category"), Some(FieldKind::Reference));
    }

    #[test]
    fn test_unique_fields() {
        let schema = category_schema();
        let unique: Vec<&str> = schema.unique_fields().collect();
        assert_eq!(unique, vec!["name", "slug"]);
        assert_eq!(product_schema().unique_fields().count(), 0);
    }
}
