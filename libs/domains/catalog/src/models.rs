use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Partial view of a related entity pulled in by an expansion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

/// A relation as stored (`Id`) or expanded with the related entity's name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Expanded(RelatedSummary),
    Id(String),
}

impl Reference {
    pub fn id(&self) -> &str {
        match self {
            Reference::Expanded(summary) => &summary.id,
            Reference::Id(id) => id,
        }
    }

    /// Name of the related entity when expanded
    pub fn name(&self) -> Option<&str> {
        match self {
            Reference::Expanded(summary) => Some(&summary.name),
            Reference::Id(_) => None,
        }
    }
}

// ============================================================================
// Category
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 3, max = 32))]
    pub name: String,
    /// Stored image file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCategory {
    #[validate(length(min = 3, max = 32))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

// ============================================================================
// SubCategory
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    /// `None` when the referenced category no longer exists
    #[serde(default)]
    pub category: Option<Reference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSubCategory {
    #[validate(length(min = 3, max = 32))]
    pub name: String,
    #[validate(length(min = 1, message = "Category reference is required"))]
    pub category: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSubCategory {
    #[validate(length(min = 3, max = 32))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

// ============================================================================
// Brand
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBrand {
    #[validate(length(min = 3, max = 32))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateBrand {
    #[validate(length(min = 3, max = 32))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

// ============================================================================
// Product
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub quantity: i64,
    #[serde(default)]
    pub sold: i64,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_after_discount: Option<f64>,
    #[serde(default)]
    pub colors: Vec<String>,
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<Reference>,
    #[serde(default)]
    pub sub_category: Vec<Reference>,
    #[serde(default)]
    pub brand: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_average: Option<f64>,
    #[serde(default)]
    pub rating_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    #[validate(length(min = 3, max = 100))]
    pub title: String,
    #[validate(length(min = 30))]
    pub description: String,
    #[validate(range(min = 0))]
    pub quantity: i64,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 0.0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_after_discount: Option<f64>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[validate(length(min = 1, message = "Product cover image is required"))]
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[validate(length(min = 1, message = "Product category is required"))]
    pub category: String,
    #[serde(default)]
    pub sub_category: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[validate(range(min = 1.0, max = 5.0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_average: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[validate(length(min = 3, max = 100))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[validate(length(min = 30))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[validate(range(min = 0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold: Option<i64>,
    #[validate(range(min = 0.0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_after_discount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[validate(range(min = 1.0, max = 5.0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_average: Option<f64>,
    #[validate(range(min = 0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_quantity: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_decodes_id_or_expanded() {
        let stored: Reference = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(stored, Reference::Id("abc".into()));
        assert_eq!(stored.name(), None);

        let expanded: Reference =
            serde_json::from_value(json!({"_id": "abc", "name": "Phones"})).unwrap();
        assert_eq!(expanded.id(), "abc");
        assert_eq!(expanded.name(), Some("Phones"));
    }

    #[test]
    fn test_product_decodes_stored_document() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1",
            "title": "Phone",
            "slug": "phone",
            "description": "A phone with a very long description text",
            "quantity": 3,
            "sold": 0,
            "price": 300,
            "imageCover": "cover.jpeg",
            "category": {"_id": "c1", "name": "Electronics"},
            "subCategory": ["s1"],
            "brand": null,
            "ratingQuantity": 0,
            "createdAt": "2026-01-02T03:04:05.000006Z",
            "updatedAt": "2026-01-02T03:04:05.000006Z",
            "__v": 0
        }))
        .unwrap();

        assert_eq!(product.price, 300.0);
        assert_eq!(product.category.as_ref().and_then(Reference::name), Some("Electronics"));
        assert_eq!(product.sub_category, vec![Reference::Id("s1".into())]);
        assert_eq!(product.brand, None);
    }

    #[test]
    fn test_update_dto_serializes_only_present_fields() {
        let update = UpdateProduct {
            price: Some(12.5),
            ..UpdateProduct::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"price": 12.5}));
    }

    #[test]
    fn test_create_product_validation() {
        let mut input = CreateProduct {
            title: "Phone".into(),
            description: "short".into(),
            quantity: 1,
            price: 10.0,
            price_after_discount: None,
            colors: vec![],
            image_cover: "cover.jpeg".into(),
            images: vec![],
            category: "c1".into(),
            sub_category: vec![],
            brand: None,
            rating_average: Some(6.0),
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("description"));
        assert!(fields.contains_key("rating_average"));

        input.description = "A description long enough to pass validation".into();
        input.rating_average = Some(4.5);
        assert!(input.validate().is_ok());
    }
}
