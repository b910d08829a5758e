//! HTTP API handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::form;
use super::pagination::{PageInfo, PageQuery, PageRequest, ProductPage};
use crate::error::ApiError;
use crate::metrics;
use crate::model::{NewProduct, Product};
use crate::store::ProductStore;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Product data access, shared by every request.
    pub store: Arc<dyn ProductStore>,
    /// Prometheus handle, when the exporter is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state around a store.
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle, enabling `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Body of a single create.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedProduct {
    /// The stored product.
    pub product: Product,
}

/// Body of a bulk create.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBatch {
    /// Stored products, in request order.
    pub created_data: Vec<Product>,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Metrics handler - renders the Prometheus exposition.
pub async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// `GET /products` - one page of products in creation order.
pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<ProductPage>, ApiError> {
    metrics::inc_requests("list_products");

    let Query(query) = query.map_err(|rejection| ApiError::InvalidQuery(rejection.body_text()))?;
    let request = PageRequest::from_query(&query)?;

    // Page and count are separate reads; the total may come from a later
    // snapshot than the rows.
    let products = {
        let _timer = metrics::timer_store("find_page");
        state
            .store
            .find_page(request.offset(), u64::from(request.limit))
            .await?
    };
    let total_count = {
        let _timer = metrics::timer_store("count");
        state.store.count().await?
    };

    let info = PageInfo::compute(request, total_count);
    debug!(
        page = info.current_page,
        returned = products.len(),
        total_count,
        "Listed products"
    );

    Ok(Json(ProductPage::new(products, info)))
}

/// `POST /products` - create one product, or a batch atomically.
pub async fn create_products(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    metrics::inc_requests("create_products");

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    match extract_data(content_type, &body)? {
        Value::Array(items) => {
            let drafts = items
                .iter()
                .map(NewProduct::from_json)
                .collect::<Result<Vec<_>, _>>()?;

            let created = {
                let _timer = metrics::timer_store("create_batch");
                state.store.create_batch(drafts).await?
            };
            metrics::add_products_created(created.len());
            info!(count = created.len(), "Created product batch");

            Ok((
                StatusCode::CREATED,
                Json(CreatedBatch {
                    created_data: created,
                }),
            )
                .into_response())
        }
        single => {
            let draft = NewProduct::from_json(&single)?;

            let product = {
                let _timer = metrics::timer_store("create_one");
                state.store.create_one(draft).await?
            };
            metrics::add_products_created(1);
            info!(id = product.id, "Created product");

            Ok((StatusCode::CREATED, Json(CreatedProduct { product })).into_response())
        }
    }
}

/// Pull the `data` field out of a create body.
///
/// JSON bodies are parsed as JSON, form bodies are decoded with bracketed
/// keys nested. Any other content type carries no fields. An empty body, a
/// body that is not an object, or a falsy `data` is an invalid-input
/// failure. A JSON body that does not parse fails with the parser's message.
fn extract_data(content_type: Option<&str>, body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::invalid_input());
    }

    let payload = match BodyKind::from_content_type(content_type) {
        BodyKind::Json => {
            serde_json::from_slice(body).map_err(|e| ApiError::Generic(e.to_string()))?
        }
        BodyKind::Form => form::decode_nested(body),
        BodyKind::Other => {
            debug!(?content_type, "Create body ignored for content type");
            return Err(ApiError::invalid_input());
        }
    };

    match payload {
        Value::Object(mut fields) => match fields.remove("data") {
            Some(data) if is_truthy(&data) => Ok(data),
            _ => Err(ApiError::invalid_input()),
        },
        _ => Err(ApiError::invalid_input()),
    }
}

/// Request body encodings the create handler reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

impl BodyKind {
    fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return BodyKind::Other;
        };
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/json" => BodyKind::Json,
            "application/x-www-form-urlencoded" => BodyKind::Form,
            _ => BodyKind::Other,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
