//! PostgreSQL product store.

use async_trait::async_trait;
use sqlx::postgres::{PgDatabaseError, PgPool, PgPoolOptions};
use tracing::{debug, error, info};

use crate::error::{FieldViolation, StoreError, ValidationError};
use crate::model::{NewProduct, Product, MODEL_NAME};

use super::ProductStore;

/// SQLSTATE raised for a NOT NULL constraint failure.
const NOT_NULL_VIOLATION: &str = "23502";

/// Table definition applied by [`PgProductStore::ensure_schema`].
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id          BIGSERIAL PRIMARY KEY,
    name        TEXT NOT NULL,
    price       NUMERIC(9, 2) NOT NULL,
    quantity    INTEGER NOT NULL DEFAULT 0,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const SELECT_PAGE: &str = "SELECT id, name, price, quantity, created_at, updated_at \
     FROM products ORDER BY id ASC LIMIT $1 OFFSET $2";

const COUNT_ALL: &str = "SELECT COUNT(*) FROM products";

const INSERT_ONE: &str = "INSERT INTO products (name, price, quantity) VALUES ($1, $2, $3) \
     RETURNING id, name, price, quantity, created_at, updated_at";

/// Product store backed by a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Connect a new pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| {
                error!("Failed to connect to the database: {}", e);
                StoreError::Database(e)
            })?;

        info!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the products table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        debug!("Products table ready");
        Ok(())
    }

    /// Underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Turn driver errors into store errors, surfacing NOT NULL failures as
/// field violations.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(NOT_NULL_VIOLATION) {
            let column = db
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(|pg| pg.column())
                .unwrap_or("unknown");
            return StoreError::Validation(ValidationError::new(vec![FieldViolation::not_null(
                MODEL_NAME, column,
            )]));
        }
    }
    StoreError::Database(err)
}

fn to_sql_bound(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_page(&self, offset: u64, limit: u64) -> Result<Vec<Product>, StoreError> {
        sqlx::query_as::<_, Product>(SELECT_PAGE)
            .bind(to_sql_bound(limit))
            .bind(to_sql_bound(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(classify)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let total: i64 = sqlx::query_scalar(COUNT_ALL)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn create_one(&self, product: NewProduct) -> Result<Product, StoreError> {
        sqlx::query_as::<_, Product>(INSERT_ONE)
            .bind(&product.name)
            .bind(product.price)
            .bind(product.quantity)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn create_batch(&self, products: Vec<NewProduct>) -> Result<Vec<Product>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(classify)?;
        let mut created = Vec::with_capacity(products.len());

        // Dropping `tx` on an early return rolls the batch back.
        for product in products {
            let row = sqlx::query_as::<_, Product>(INSERT_ONE)
                .bind(&product.name)
                .bind(product.price)
                .bind(product.quantity)
                .fetch_one(&mut *tx)
                .await
                .map_err(classify)?;
            created.push(row);
        }

        tx.commit().await.map_err(classify)?;
        debug!(count = created.len(), "Committed product batch");
        Ok(created)
    }
}
