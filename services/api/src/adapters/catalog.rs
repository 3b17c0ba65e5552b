//! services/api/src/adapters/catalog.rs
//!
//! Read-only access to the catalog's product table. The catalog pipeline
//! owns that data; this adapter only resolves ids for the cart and
//! wishlist paths.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use storefront_core::domain::Product;
use storefront_core::ports::{CatalogReader, PortError, PortResult};
use uuid::Uuid;

/// A database adapter that implements the `CatalogReader` port.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    /// Creates a new `PgCatalog`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ProductRecord {
    id: Uuid,
    title: String,
    price: Decimal,
    discount_percent: Decimal,
    available_stock: i32,
}
impl ProductRecord {
    fn to_domain(self) -> Product {
        Product {
            id: self.id,
            title: self.title,
            price: self.price,
            discount_percent: self.discount_percent,
            available_stock: self.available_stock,
        }
    }
}

#[async_trait]
impl CatalogReader for PgCatalog {
    async fn lookup_product(&self, product_id: Uuid) -> PortResult<Product> {
        let record = sqlx::query_as::<_, ProductRecord>(
            "SELECT id, title, price, discount_percent, available_stock \
             FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Product {} not found", product_id))
            }
            _ => PortError::Unavailable(e.to_string()),
        })?;
        Ok(record.to_domain())
    }
}
