//! Error normalization: every failed request ends here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use crate::error::{ApiError, FieldViolation, ViolationKind};
use crate::metrics;

/// Wire type of a rewritten not-null violation.
pub const NOT_NULL_TYPE: &str = "not_null_violation";

/// One entry of a `400 {errors: [...]}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Violation type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

/// Map a field violation to its wire form.
///
/// Not-null violations are renamed and lose the `Model.` prefix of their
/// message; everything else passes through unchanged.
pub fn normalize_violation(violation: &FieldViolation) -> ErrorDetail {
    match violation.kind {
        ViolationKind::NotNull => ErrorDetail {
            kind: NOT_NULL_TYPE.to_string(),
            message: strip_model_prefix(&violation.message).to_string(),
        },
        kind => ErrorDetail {
            kind: kind.as_str().to_string(),
            message: violation.message.clone(),
        },
    }
}

/// Segment between the first and second `.`, or the whole message if it has none.
fn strip_model_prefix(message: &str) -> &str {
    message.split('.').nth(1).unwrap_or(message)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(validation) => {
                warn!(error = %validation, "Rejected invalid product");
                metrics::inc_request_errors("validation");
                let errors: Vec<ErrorDetail> =
                    validation.violations.iter().map(normalize_violation).collect();
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            ApiError::InvalidQuery(message) => {
                warn!(%message, "Rejected invalid query");
                metrics::inc_request_errors("query");
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Generic(message) => {
                error!(%message, "Request failed");
                metrics::inc_request_errors("generic");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }
            ApiError::Opaque => {
                error!("Request failed without an error message");
                metrics::inc_request_errors("opaque");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn not_null_is_renamed_and_stripped() {
        let detail = normalize_violation(&FieldViolation::not_null("Product", "name"));
        assert_eq!(
            detail,
            ErrorDetail {
                kind: "not_null_violation".to_string(),
                message: "name cannot be null".to_string(),
            }
        );
    }

    #[test]
    fn other_violations_pass_through() {
        let detail = normalize_violation(&FieldViolation::string_violation("name"));
        assert_eq!(detail.kind, "string violation");
        assert_eq!(detail.message, "name cannot be an array or an object");

        let detail = normalize_violation(&FieldViolation::invalid("price", "x.y is odd"));
        assert_eq!(detail.kind, "Validation error");
        assert_eq!(detail.message, "x.y is odd");
    }

    #[test]
    fn message_without_separator_is_kept() {
        assert_eq!(strip_model_prefix("name cannot be null"), "name cannot be null");
        assert_eq!(strip_model_prefix("A.b.c"), "b");
    }

    #[tokio::test]
    async fn validation_maps_to_400_with_errors() {
        let response = ApiError::Validation(ValidationError::new(vec![
            FieldViolation::not_null("Product", "name"),
            FieldViolation::invalid("price", "\"x\" is not a valid decimal"),
        ]))
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"errors": [
                {"type": "not_null_violation", "message": "name cannot be null"},
                {"type": "Validation error", "message": "\"x\" is not a valid decimal"},
            ]})
        );
    }

    #[tokio::test]
    async fn generic_maps_to_500_with_message() {
        let response = ApiError::invalid_input().into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Invalid input data."})
        );
    }

    #[tokio::test]
    async fn opaque_maps_to_empty_500() {
        let response = ApiError::Opaque.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn invalid_query_maps_to_400_with_message() {
        let response = ApiError::InvalidQuery("page must be a positive integer".into())
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "page must be a positive integer"})
        );
    }
}
