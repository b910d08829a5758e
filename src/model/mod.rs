//! Product entity and the field validation applied before a write.

pub mod product;

pub use product::{NewProduct, Product, MODEL_NAME};
