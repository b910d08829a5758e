//! Product records.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FieldViolation, ValidationError};

/// Model name used as the prefix of raw violation messages.
pub const MODEL_NAME: &str = "Product";

/// Fractional digits kept on prices.
pub const PRICE_SCALE: u32 = 2;

/// Largest price magnitude a `decimal(9, 2)` column holds: 9999999.99.
pub const MAX_PRICE: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, PRICE_SCALE);

/// A persisted product row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned identity, ascending in creation order.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unit price with two fractional digits.
    // JSON number, the wire form of a FLOAT(9,2) price column.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Units in stock.
    pub quantity: i32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// A validated product that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    /// Display name, never empty.
    pub name: String,
    /// Unit price, rounded to [`PRICE_SCALE`] digits.
    pub price: Decimal,
    /// Units in stock, 0 when omitted.
    pub quantity: i32,
}

impl NewProduct {
    /// Build a product from already-typed values.
    pub fn new(name: impl Into<String>, price: Decimal, quantity: i32) -> Self {
        Self {
            name: name.into(),
            price: price.round_dp(PRICE_SCALE),
            quantity,
        }
    }

    /// Validate a JSON record.
    ///
    /// Every field is checked and all violations are reported together, in
    /// `name`, `price`, `quantity` order. A value that is not a JSON object is
    /// treated as a record with no fields.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let fields = value.as_object();
        let field = |key: &str| fields.and_then(|map| map.get(key));

        let mut violations = Vec::new();

        let name = match parse_name(field("name")) {
            Ok(name) => Some(name),
            Err(violation) => {
                violations.push(violation);
                None
            }
        };

        let price = match parse_price(field("price")) {
            Ok(price) => Some(price),
            Err(violation) => {
                violations.push(violation);
                None
            }
        };

        let quantity = match parse_quantity(field("quantity")) {
            Ok(quantity) => Some(quantity),
            Err(violation) => {
                violations.push(violation);
                None
            }
        };

        match (name, price, quantity) {
            (Some(name), Some(price), Some(quantity)) => Ok(Self::new(name, price, quantity)),
            _ => Err(ValidationError::new(violations)),
        }
    }
}

fn parse_name(value: Option<&Value>) -> Result<String, FieldViolation> {
    match value {
        None | Some(Value::Null) => Err(FieldViolation::not_null(MODEL_NAME, "name")),
        Some(Value::Array(_)) | Some(Value::Object(_)) => {
            Err(FieldViolation::string_violation("name"))
        }
        Some(Value::String(s)) if s.is_empty() => Err(FieldViolation::invalid(
            "name",
            "Validation notEmpty on name failed",
        )),
        Some(Value::String(s)) => Ok(s.clone()),
        // Numbers and booleans are stored in their text form
        Some(other) => Ok(other.to_string()),
    }
}

fn parse_price(value: Option<&Value>) -> Result<Decimal, FieldViolation> {
    let invalid = |v: &Value| FieldViolation::invalid("price", format!("{v} is not a valid decimal"));

    let (raw, parsed) = match value {
        None | Some(Value::Null) => return Err(FieldViolation::not_null(MODEL_NAME, "price")),
        Some(v @ Value::Number(n)) => (v, parse_decimal(&n.to_string())),
        Some(v @ Value::String(s)) => (v, parse_decimal(s.trim())),
        Some(other) => return Err(invalid(other)),
    };
    let price = parsed.ok_or_else(|| invalid(raw))?;

    // Range applies to the stored (rounded) value
    if price.round_dp(PRICE_SCALE).abs() > MAX_PRICE {
        return Err(FieldViolation::invalid(
            "price",
            format!("{raw} is out of range for decimal(9, 2)"),
        ));
    }

    Ok(price)
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn parse_quantity(value: Option<&Value>) -> Result<i32, FieldViolation> {
    let invalid =
        |v: &Value| FieldViolation::invalid("quantity", format!("{v} is not a valid integer"));

    match value {
        None => Ok(0),
        Some(Value::Null) => Err(FieldViolation::not_null(MODEL_NAME, "quantity")),
        Some(v @ Value::Number(n)) => n
            .as_i64()
            .and_then(|q| i32::try_from(q).ok())
            .ok_or_else(|| invalid(v)),
        Some(v @ Value::String(s)) => s.trim().parse::<i32>().map_err(|_| invalid(v)),
        Some(other) => Err(invalid(other)),
    }
}
