//! HTTP API module for the product endpoints.

pub mod errors;
pub mod form;
pub mod handlers;
pub mod pagination;
pub mod routes;

pub use errors::{normalize_violation, ErrorDetail};
pub use handlers::AppState;
pub use pagination::{PageInfo, PageRequest, ProductPage};
pub use routes::create_router;
