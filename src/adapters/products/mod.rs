//! Product Store Adapters.
//!
//! - `PostgresProductStore` - `products` table via sqlx
//! - `InMemoryProductStore` - vector-backed catalog, optionally loaded from JSON

mod in_memory;
mod postgres;

pub use in_memory::InMemoryProductStore;
pub use postgres::PostgresProductStore;
