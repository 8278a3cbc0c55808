//! Product Store Port - Best-effort catalog lookup by supplement name.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Product;

/// Port for the product catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Returns the best product whose normalized name contains the query
    /// fragment, or `None`.
    ///
    /// With a preference group, products in that group win over products in
    /// the wildcard group; products in other groups never match.
    async fn find_first(&self, query: &ProductQuery) -> Result<Option<Product>, ProductStoreError>;
}

/// Catalog lookup parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Already-normalized name fragment, matched case-insensitively.
    pub name_fragment: String,
    /// Preference group filter.
    pub preference_group: Option<String>,
}

impl ProductQuery {
    /// Creates a query without a group filter.
    pub fn new(name_fragment: impl Into<String>) -> Self {
        Self {
            name_fragment: name_fragment.into(),
            preference_group: None,
        }
    }

    /// Restricts results to a preference group (plus the wildcard group).
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.preference_group = Some(group.into());
        self
    }
}

/// Product store errors.
#[derive(Debug, Error)]
pub enum ProductStoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Catalog load failed: {0}")]
    Load(String),
}
