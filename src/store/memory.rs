//! In-memory product store.
//!
//! Serves the binary when no database is configured and stands in for
//! PostgreSQL in tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::model::{NewProduct, Product};

use super::ProductStore;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Product>,
    last_id: i64,
    outage: Option<String>,
}

impl Table {
    fn check_available(&self) -> Result<(), StoreError> {
        match &self.outage {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn materialize(&mut self, product: NewProduct) -> Product {
        self.last_id += 1;
        let now = Utc::now();
        Product {
            id: self.last_id,
            name: product.name,
            price: product.price,
            quantity: product.quantity,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Product store kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    table: Arc<RwLock<Table>>,
}

impl InMemoryProductStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with [`StoreError::Unavailable`] until cleared.
    pub async fn set_outage(&self, reason: Option<String>) {
        self.table.write().await.outage = reason;
    }

    /// Snapshot of every stored row.
    pub async fn all(&self) -> Vec<Product> {
        self.table.read().await.rows.clone()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_page(&self, offset: u64, limit: u64) -> Result<Vec<Product>, StoreError> {
        let table = self.table.read().await;
        table.check_available()?;

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(table.rows.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let table = self.table.read().await;
        table.check_available()?;
        Ok(table.rows.len() as u64)
    }

    async fn create_one(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut table = self.table.write().await;
        table.check_available()?;

        let created = table.materialize(product);
        table.rows.push(created.clone());
        debug!(id = created.id, "Stored product");
        Ok(created)
    }

    async fn create_batch(&self, products: Vec<NewProduct>) -> Result<Vec<Product>, StoreError> {
        // The write guard is held for the whole batch, so readers never see
        // a partial insert.
        let mut table = self.table.write().await;
        table.check_available()?;

        let created: Vec<Product> = products
            .into_iter()
            .map(|product| table.materialize(product))
            .collect();
        table.rows.extend(created.iter().cloned());
        debug!(count = created.len(), "Stored product batch");
        Ok(created)
    }
}
