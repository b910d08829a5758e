//! Product catalogue HTTP service.
//!
//! Serves a single `Product` resource (name, price, quantity) over two
//! endpoints:
//!
//! ```text
//! GET  /products?page=2&limit=10   -> 200 {products, totalPages, currentPage, hasMore}
//! POST /products {"data": {...}}   -> 201 {product}
//! POST /products {"data": [...]}   -> 201 {createdData}   (all-or-nothing)
//! ```
//!
//! Failures are classified once, in [`api::errors`]: field violations become
//! `400 {errors: [...]}`, everything else `500 {error}`.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`model`]: Product entity and field validation
//! - [`store`]: Data access trait, in-memory and PostgreSQL stores
//! - [`api`]: HTTP handlers, pagination and error normalization
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{Result, ServiceError};
