//! Resource factory against the in-memory adapter
//!
//! Exercises the full path: request parameters, pipeline, factory, adapter.

use query_features::{FilterExpression, Populate, RequestParams};
use resource_factory::{
    CollectionSchema, Document, EntityDescriptor, ErrorKind, FactoryError, FieldRule,
    InMemoryDatabase, ResourceFactory,
};
use serde_json::{Value, json};
use std::sync::Arc;

// ============================================================================
// Fixtures
// ============================================================================

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

struct Fixture {
    categories: ResourceFactory,
    products: ResourceFactory,
}

fn fixture() -> Fixture {
    let db = InMemoryDatabase::new();

    let category_schema = CollectionSchema::new()
        .field("name", FieldRule::string().required().unique().length(3, 32));
    let categories = EntityDescriptor::builder(
        "categories",
        "Category",
        Arc::new(db.collection("categories", category_schema.clone())),
    )
    .plural_name("Categories")
    .schema(category_schema)
    .build();

    let product_schema = CollectionSchema::new()
        .field("title", FieldRule::string().required().length(3, 100))
        .field("description", FieldRule::string())
        .field("price", FieldRule::number().required().min(0.0))
        .field("sold", FieldRule::number().default_value(0))
        .field("category", FieldRule::reference().required());
    let products = EntityDescriptor::builder(
        "products",
        "Product",
        Arc::new(db.collection("products", product_schema.clone())),
    )
    .expand(Populate::new("category", "categories").select(["name"]))
    .search_fields(["title", "description"])
    .schema(product_schema)
    .build();

    Fixture {
        categories: ResourceFactory::new(categories),
        products: ResourceFactory::new(products),
    }
}

async fn seed_category(fixture: &Fixture, name: &str) -> String {
    let created = fixture
        .categories
        .create_one(doc(json!({ "name": name })))
        .await
        .unwrap();
    created["_id"].as_str().unwrap().to_string()
}

async fn seed_products(fixture: &Fixture, category: &str, prices: &[i64]) {
    for (i, price) in prices.iter().enumerate() {
        fixture
            .products
            .create_one(doc(json!({
                "title": format!("Product {}", i),
                "description": "plain item",
                "price": price,
                "category": category,
            })))
            .await
            .unwrap();
    }
}

fn params(query: &str) -> RequestParams {
    RequestParams::from_query_string(query)
}

// ============================================================================
// Create / read
// ============================================================================

#[tokio::test]
async fn test_create_with_expansion_returns_related_name() {
    let fixture = fixture();
    let category = seed_category(&fixture, "Electronics").await;

    let product = fixture
        .products
        .create_one(doc(json!({
            "title": "Phone",
            "price": 300,
            "category": category,
        })))
        .await
        .unwrap();

    assert_eq!(product["category"]["name"], json!("Electronics"));
    assert_eq!(product["category"]["_id"], json!(category));
    assert_eq!(product["sold"], json!(0));
    assert!(product["createdAt"].is_string());
}

#[tokio::test]
async fn test_duplicate_name_is_conflict() {
    let fixture = fixture();
    seed_category(&fixture, "Books").await;

    let err = fixture
        .categories
        .create_one(doc(json!({ "name": "Books" })))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.kind().status_code(), 409);
}

#[tokio::test]
async fn test_schema_violation_is_validation() {
    let fixture = fixture();
    let err = fixture
        .categories
        .create_one(doc(json!({ "name": "ab" })))
        .await
        .unwrap_err();
    assert!(matches!(err, FactoryError::Validation(ref msg) if msg.contains("name")));
}

// ============================================================================
// Not-found contract
// ============================================================================

#[tokio::test]
async fn test_missing_id_is_not_found_for_get_update_delete() {
    let fixture = fixture();
    let id = seed_category(&fixture, "Garden").await;
    fixture.categories.delete_one(&id).await.unwrap();

    let get = fixture.categories.get_one(&id).await.unwrap_err();
    let update = fixture
        .categories
        .update_one(&id, doc(json!({ "name": "Yard" })))
        .await
        .unwrap_err();
    let delete = fixture.categories.delete_one(&id).await.unwrap_err();

    for err in [get, update, delete] {
        assert_eq!(err, FactoryError::NotFound("Category not found".to_string()));
    }
}

#[tokio::test]
async fn test_malformed_id_is_validation() {
    let fixture = fixture();
    let err = fixture.categories.get_one("not-an-id").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ============================================================================
// Update / delete
// ============================================================================

#[tokio::test]
async fn test_update_returns_new_document_and_validates() {
    let fixture = fixture();
    let id = seed_category(&fixture, "Toys").await;

    let updated = fixture
        .categories
        .update_one(&id, doc(json!({ "name": "Games" })))
        .await
        .unwrap();
    assert_eq!(updated["name"], json!("Games"));

    let err = fixture
        .categories
        .update_one(&id, doc(json!({ "name": "x" })))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_delete_messages() {
    let fixture = fixture();
    let id = seed_category(&fixture, "Music").await;
    seed_category(&fixture, "Films").await;
    seed_category(&fixture, "Games").await;

    let deleted = fixture.categories.delete_one(&id).await.unwrap();
    assert_eq!(deleted.message, "Category deleted successfully");

    let deleted = fixture
        .categories
        .delete_many(FilterExpression::new())
        .await
        .unwrap();
    assert_eq!(deleted.deleted_count, 2);
    assert_eq!(deleted.message, "2 Categories deleted successfully");
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_price_range_is_inclusive_and_numeric() {
    let fixture = fixture();
    let category = seed_category(&fixture, "Tools").await;
    seed_products(&fixture, &category, &[99, 100, 250, 500, 501]).await;

    let page = fixture
        .products
        .get_all(&params("price[gte]=100&price[lte]=500&sort=price"))
        .await
        .unwrap();

    let prices: Vec<i64> = page.data.iter().map(|p| p["price"].as_i64().unwrap()).collect();
    assert_eq!(prices, vec![100, 250, 500]);
    assert_eq!(page.total_count, 3);
}

#[tokio::test]
async fn test_pagination_envelope() {
    let fixture = fixture();
    let category = seed_category(&fixture, "Office").await;
    seed_products(&fixture, &category, &[1, 2, 3, 4, 5, 6, 7]).await;

    let page = fixture.products.get_all(&params("page=2&limit=3")).await.unwrap();
    assert_eq!(page.results, 3);
    assert_eq!(page.total_count, 7);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.current_page, 2);

    let last = fixture.products.get_all(&params("page=3&limit=3")).await.unwrap();
    assert_eq!(last.results, 1);
}

#[tokio::test]
async fn test_default_sort_is_newest_first() {
    let fixture = fixture();
    let category = seed_category(&fixture, "Kitchen").await;
    seed_products(&fixture, &category, &[10, 20, 30]).await;

    let page = fixture.products.get_all(&RequestParams::new()).await.unwrap();
    let titles: Vec<&str> = page.data.iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Product 2", "Product 1", "Product 0"]);
}

#[tokio::test]
async fn test_search_and_count_agree() {
    let fixture = fixture();
    let category = seed_category(&fixture, "Apparel").await;
    seed_products(&fixture, &category, &[1, 2, 3, 4, 5, 6, 7]).await;
    for title in ["Red shirt", "Dark red cap", "Scarf"] {
        fixture
            .products
            .create_one(doc(json!({
                "title": title,
                "description": if title == "Scarf" { "bright RED wool" } else { "cotton" },
                "price": 20,
                "category": category,
            })))
            .await
            .unwrap();
    }

    let page = fixture
        .products
        .get_all(&params("keyword=red&limit=2"))
        .await
        .unwrap();
    assert_eq!(page.total_count, 3);
    assert_eq!(page.results, 2);
    assert_eq!(page.total_pages, 2);
}

#[tokio::test]
async fn test_listing_populates_and_projects() {
    let fixture = fixture();
    let category = seed_category(&fixture, "Sports").await;
    seed_products(&fixture, &category, &[5]).await;

    let page = fixture
        .products
        .get_all(&params("fields=title,category"))
        .await
        .unwrap();
    let product = &page.data[0];
    assert_eq!(product["category"]["name"], json!("Sports"));
    assert!(product.contains_key("_id"));
    assert!(!product.contains_key("price"));
}

#[tokio::test]
async fn test_scoped_listing_wins_over_request_filter() {
    let fixture = fixture();
    let first = seed_category(&fixture, "First").await;
    let second = seed_category(&fixture, "Second").await;
    seed_products(&fixture, &first, &[1, 2]).await;
    seed_products(&fixture, &second, &[3]).await;

    let scope = FilterExpression::new().eq("category", first.clone());
    let page = fixture
        .products
        .get_all_scoped(&params(&format!("category={}", second)), scope)
        .await
        .unwrap();
    assert_eq!(page.total_count, 2);
    assert!(page.data.iter().all(|p| p["category"]["_id"] == json!(first)));
}

#[tokio::test]
async fn test_listing_twice_is_idempotent() {
    let fixture = fixture();
    let category = seed_category(&fixture, "Pets").await;
    seed_products(&fixture, &category, &[4, 8, 15, 16]).await;

    let request = params("sort=-price&limit=3");
    let first = fixture.products.get_all(&request).await.unwrap();
    let second = fixture.products.get_all(&request).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unknown_operator_is_rejected() {
    let fixture = fixture();
    let err = fixture
        .products
        .get_all(&params("price[where]=1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_count_and_exists() {
    let fixture = fixture();
    let category = seed_category(&fixture, "Beauty").await;
    seed_products(&fixture, &category, &[1, 2]).await;

    let by_category = FilterExpression::new().eq("category", category);
    assert_eq!(fixture.products.count(by_category.clone()).await.unwrap(), 2);
    assert!(fixture.products.exists(by_category).await.unwrap());
    assert!(
        !fixture
            .products
            .exists(FilterExpression::new().eq("title", "Nothing"))
            .await
            .unwrap()
    );
}
