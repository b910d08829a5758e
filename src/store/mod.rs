//! Product data access.
//!
//! This module handles:
//! - The [`ProductStore`] trait handlers are written against
//! - An in-memory store (default, and used by tests)
//! - A PostgreSQL store backed by `sqlx`

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{NewProduct, Product};

pub use memory::InMemoryProductStore;
pub use postgres::PgProductStore;

/// Data access capability over product rows.
///
/// Rows are always returned in ascending `id` order, which is creation order.
#[async_trait]
pub trait ProductStore: fmt::Debug + Send + Sync {
    /// Fetch at most `limit` rows after skipping `offset` rows.
    async fn find_page(&self, offset: u64, limit: u64) -> Result<Vec<Product>, StoreError>;

    /// Count all rows.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Persist a single product.
    async fn create_one(&self, product: NewProduct) -> Result<Product, StoreError>;

    /// Persist all products in one transaction, preserving input order.
    ///
    /// Either every product is persisted or none is.
    async fn create_batch(&self, products: Vec<NewProduct>) -> Result<Vec<Product>, StoreError>;
}
