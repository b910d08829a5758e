//! Unified error types for the product service.

use std::fmt;

use thiserror::Error;

/// Message of the generic error raised when a create request carries no usable `data`.
pub const INVALID_INPUT_MESSAGE: &str = "Invalid input data.";

/// Process-level error: anything that stops the service from starting or serving.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Metrics exporter could not be installed.
    #[error("metrics error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Kind of a field-level constraint violation, rendered with the
/// persistence engine's type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// A required field is missing or null.
    NotNull,
    /// A text field received an array or an object.
    StringViolation,
    /// A value failed a type or content check.
    Invalid,
}

impl ViolationKind {
    /// Wire name of the violation type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::NotNull => "notNull Violation",
            ViolationKind::StringViolation => "string violation",
            ViolationKind::Invalid => "Validation error",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Violation type.
    pub kind: ViolationKind,
    /// Offending field name.
    pub field: String,
    /// Raw message, e.g. `Product.name cannot be null`.
    pub message: String,
}

impl FieldViolation {
    /// Required field absent or null on the given model.
    pub fn not_null(model: &str, field: &str) -> Self {
        Self {
            kind: ViolationKind::NotNull,
            field: field.to_string(),
            message: format!("{model}.{field} cannot be null"),
        }
    }

    /// Text field given a structured value.
    pub fn string_violation(field: &str) -> Self {
        Self {
            kind: ViolationKind::StringViolation,
            field: field.to_string(),
            message: format!("{field} cannot be an array or an object"),
        }
    }

    /// Any other rejected value.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self {
            kind: ViolationKind::Invalid,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Ordered set of field violations reported for one record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Violations in field order.
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Wrap a non-empty list of violations.
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.kind, v.message))
            .collect();
        write!(f, "{}", rendered.join(",\n"))
    }
}

/// Data access errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store rejected one or more fields.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Database driver error (connection, constraint, query).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store cannot serve requests right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Request failure, classified for the HTTP error normalizer.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Field-level validation failure.
    #[error("validation failed: {0}")]
    Validation(ValidationError),

    /// Malformed query parameters.
    #[error("{0}")]
    InvalidQuery(String),

    /// Any other failure carrying a message.
    #[error("{0}")]
    Generic(String),

    /// Failure with nothing to report, such as a handler panic.
    #[error("request failed")]
    Opaque,
}

impl ApiError {
    /// The error raised when a create request has no usable `data`.
    pub fn invalid_input() -> Self {
        ApiError::Generic(INVALID_INPUT_MESSAGE.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(validation) => ApiError::Validation(validation),
            other => ApiError::Generic(other.to_string()),
        }
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;
