use serde_json::{Number, Value};
use thiserror::Error;

use crate::models::ProductInput;

/// Why a create/update body was refused. The display text is returned to the
/// client verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Product name is required.")]
    MissingName,
    #[error("Quantity must be 0 or greater.")]
    InvalidQuantity,
    #[error("Price must be 0 or greater.")]
    InvalidPrice,
}

/// The required fields of a product after they passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidProduct {
    pub name: String,
    pub quantity: Number,
    pub price: Number,
}

/// Checks name, quantity and price in that order; the first failure wins.
///
/// Each rule only looks at its own field, so a body with a bad name is
/// reported as such whatever the other fields hold. Quantity and price must
/// be JSON numbers; `null`, strings and other types fail their rule.
pub fn validate(input: &ProductInput) -> Result<ValidProduct, ValidationError> {
    let name = match input.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        _ => return Err(ValidationError::MissingName),
    };
    let quantity = non_negative(input.get("quantity")).ok_or(ValidationError::InvalidQuantity)?;
    let price = non_negative(input.get("price")).ok_or(ValidationError::InvalidPrice)?;

    Ok(ValidProduct {
        name,
        quantity,
        price,
    })
}

fn non_negative(value: Option<&Value>) -> Option<Number> {
    match value? {
        Value::Number(n) if n.as_f64().is_some_and(|f| f >= 0.0) => Some(n.clone()),
        _ => None,
    }
}
