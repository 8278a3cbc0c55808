//! PostgreSQL implementation of ProductStore.
//!
//! Reads the `products` table. Matching is a case-insensitive substring test
//! on `normalized_product_name`; with a preference group, rows in that group
//! sort ahead of rows in the wildcard group.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Product, WILDCARD_GROUP};
use crate::ports::{ProductQuery, ProductStore, ProductStoreError};

/// PostgreSQL implementation of the ProductStore port.
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    /// Creates a new PostgresProductStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for sqlx query mapping.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    source: Option<String>,
    country: Option<String>,
    category: Option<String>,
    gender: Option<String>,
    #[sqlx(rename = "type")]
    product_type: Option<String>,
    product_name: Option<String>,
    price: Option<f64>,
    description: Option<String>,
    image_url: Option<String>,
    product_url: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    normalized_product_name: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            source: row.source,
            country: row.country,
            category: row.category,
            gender: row.gender,
            product_type: row.product_type,
            product_name: row.product_name,
            price: row.price,
            description: row.description,
            image_url: row.image_url,
            product_url: row.product_url,
            start_date: row.start_date,
            end_date: row.end_date,
            normalized_product_name: row.normalized_product_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Escapes LIKE metacharacters so the fragment matches literally.
fn escape_like(fragment: &str) -> String {
    fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    async fn find_first(&self, query: &ProductQuery) -> Result<Option<Product>, ProductStoreError> {
        let pattern = format!("%{}%", escape_like(&query.name_fragment));

        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT source, country, category, gender, type, product_name,
                   price::float8 AS price, description, image_url, product_url,
                   start_date::text AS start_date, end_date::text AS end_date,
                   normalized_product_name, created_at, updated_at
            FROM products
            WHERE normalized_product_name ILIKE $1
              AND ($2::text IS NULL OR lower(gender) = lower($2) OR gender = $3)
            ORDER BY (lower(gender) = lower($2)) DESC NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(&pattern)
        .bind(query.preference_group.as_deref())
        .bind(WILDCARD_GROUP)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ProductStoreError::Database(format!("Failed to find product: {}", e)))?;

        Ok(row.map(Product::from))
    }
}
