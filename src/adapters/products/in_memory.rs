//! In-memory implementation of ProductStore.
//!
//! Holds the whole catalog in a vector. Used for tests and for running
//! without a database, optionally seeded from a JSON array on disk.

use async_trait::async_trait;
use std::path::Path;

use crate::domain::{Product, WILDCARD_GROUP};
use crate::ports::{ProductQuery, ProductStore, ProductStoreError};

/// In-memory product catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    products: Vec<Product>,
}

impl InMemoryProductStore {
    /// Creates a store over the given products.
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Loads a catalog from a JSON file holding an array of products.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ProductStoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProductStoreError::Load(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let products: Vec<Product> = serde_json::from_str(&raw).map_err(|e| {
            ProductStoreError::Load(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), count = products.len(), "Loaded product catalog");
        Ok(Self::new(products))
    }

    /// Number of products in the catalog.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

fn same_group(product: &Product, group: &str) -> bool {
    product
        .gender
        .as_deref()
        .is_some_and(|g| g.eq_ignore_ascii_case(group))
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_first(&self, query: &ProductQuery) -> Result<Option<Product>, ProductStoreError> {
        let fragment = query.name_fragment.to_lowercase();
        let mut candidates = self
            .products
            .iter()
            .filter(|p| p.match_name().to_lowercase().contains(&fragment));

        let Some(group) = query.preference_group.as_deref() else {
            return Ok(candidates.next().cloned());
        };

        let mut wildcard = None;
        for product in candidates {
            if same_group(product, group) {
                return Ok(Some(product.clone()));
            }
            if wildcard.is_none() && product.gender.as_deref() == Some(WILDCARD_GROUP) {
                wildcard = Some(product.clone());
            }
        }
        Ok(wildcard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn product(name: &str, gender: &str) -> Product {
        Product {
            product_name: Some(name.to_string()),
            gender: Some(gender.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn matches_normalized_substring() {
        let store = InMemoryProductStore::new(vec![
            product("Zinc Picolinate 50mg", "All"),
            product("Magnesium Glycinate", "All"),
        ]);

        let found = store
            .find_first(&ProductQuery::new("magnesium"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.product_name.as_deref(), Some("Magnesium Glycinate"));
        assert!(store
            .find_first(&ProductQuery::new("iron"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn prefers_exact_group_over_wildcard() {
        let store = InMemoryProductStore::new(vec![
            product("Iron Complex", "All"),
            product("Iron For Women", "Female"),
        ]);

        let found = store
            .find_first(&ProductQuery::new("iron").in_group("female"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.product_name.as_deref(), Some("Iron For Women"));
    }

    #[tokio::test]
    async fn falls_back_to_wildcard_and_excludes_other_groups() {
        let store = InMemoryProductStore::new(vec![
            product("Iron For Men", "Male"),
            product("Iron Complex", "All"),
        ]);

        let found = store
            .find_first(&ProductQuery::new("iron").in_group("Female"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.product_name.as_deref(), Some("Iron Complex"));

        let only_male = InMemoryProductStore::new(vec![product("Iron For Men", "Male")]);
        assert!(only_male
            .find_first(&ProductQuery::new("iron").in_group("Female"))
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn loads_catalog_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"product_name": "Omega-3 Fish Oil", "gender": "All", "price": 19.99, "type": "softgel"}}]"#
        )
        .unwrap();

        let store = InMemoryProductStore::from_json_file(file.path()).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.products[0].product_type.as_deref(), Some("softgel"));
    }

    #[test]
    fn missing_catalog_file_is_a_load_error() {
        let result = InMemoryProductStore::from_json_file("/nonexistent/catalog.json");
        assert!(matches!(result, Err(ProductStoreError::Load(_))));
    }

    #[tokio::test]
    async fn bundled_example_catalog_loads() {
        let store = InMemoryProductStore::from_json_file(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/config/catalog.example.json"
        ))
        .unwrap();
        assert_eq!(store.len(), 3);

        let found = store
            .find_first(&ProductQuery::new("creatine").in_group("male"))
            .await
            .unwrap();
        assert_eq!(
            found.and_then(|p| p.product_name).as_deref(),
            Some("Creatine Monohydrate")
        );
    }
}
