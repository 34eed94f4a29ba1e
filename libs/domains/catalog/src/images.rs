//! Public URLs for stored image names.

use resource_factory::Document;
use serde_json::Value;

use crate::config::CatalogConfig;

/// A document field holding one image name or a list of them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageField {
    pub field: &'static str,
    pub path: &'static str,
}

pub const CATEGORY_IMAGES: &[ImageField] = &[ImageField {
    field: "image",
    path: "category",
}];

pub const BRAND_IMAGES: &[ImageField] = &[ImageField {
    field: "image",
    path: "brand",
}];

pub const PRODUCT_IMAGES: &[ImageField] = &[
    ImageField {
        field: "imageCover",
        path: "products/imageCover",
    },
    ImageField {
        field: "images",
        path: "products/productimage",
    },
];

/// `{base_url}/{path}/{name}`; names that already are URLs are kept
pub fn image_url(config: &CatalogConfig, path: &str, name: &str) -> String {
    match config.base_url.as_deref() {
        Some(base) if !is_url(name) => format!("{}/{}/{}", base, path, name),
        _ => name.to_string(),
    }
}

fn is_url(name: &str) -> bool {
    name.starts_with("http://") || name.starts_with("https://")
}

/// Rewrite the image fields of `document` into public URLs
pub fn resolve_images(document: &mut Document, fields: &[ImageField], config: &CatalogConfig) {
    if config.base_url.is_none() {
        return;
    }
    for image in fields {
        match document.get_mut(image.field) {
            Some(Value::String(name)) if !name.is_empty() => {
                *name = image_url(config, image.path, name);
            }
            Some(Value::Array(names)) => {
                for name in names.iter_mut() {
                    if let Value::String(name) = name {
                        *name = image_url(config, image.path, name);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_image_url_with_base() {
        let config = CatalogConfig::new().with_base_url("http://localhost:7000");
        assert_eq!(
            image_url(&config, "category", "category-1.jpeg"),
            "http://localhost:7000/category/category-1.jpeg"
        );
    }

    #[test]
    fn test_absolute_urls_are_not_prefixed_twice() {
        let config = CatalogConfig::new().with_base_url("http://cdn");
        assert_eq!(
            image_url(&config, "products/productimage", "https://other/a.png"),
            "https://other/a.png"
        );
    }

    #[test]
    fn test_resolve_product_images() {
        let config = CatalogConfig::new().with_base_url("http://cdn");
        let mut product = doc(json!({
            "imageCover": "cover.jpeg",
            "images": ["a.jpeg", "b.jpeg"],
            "title": "cover.jpeg"
        }));
        resolve_images(&mut product, PRODUCT_IMAGES, &config);

        assert_eq!(product["imageCover"], json!("http://cdn/products/imageCover/cover.jpeg"));
        assert_eq!(
            product["images"],
            json!([
                "http://cdn/products/productimage/a.jpeg",
                "http://cdn/products/productimage/b.jpeg"
            ])
        );
        assert_eq!(product["title"], json!("cover.jpeg"));
    }

    #[test]
    fn test_without_base_url_documents_are_unchanged() {
        let original = doc(json!({"image": "brand-1.jpeg"}));
        let mut brand = original.clone();
        resolve_images(&mut brand, BRAND_IMAGES, &CatalogConfig::new());
        assert_eq!(brand, original);
    }

    #[test]
    fn test_projected_away_images_are_ignored() {
        let config = CatalogConfig::new().with_base_url("http://cdn");
        let mut category = doc(json!({"name": "Phones"}));
        resolve_images(&mut category, CATEGORY_IMAGES, &config);
        assert!(!category.contains_key("image"));
    }
}
