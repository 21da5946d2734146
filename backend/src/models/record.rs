use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::product::{Extra, Product, CORE_KEYS};
use crate::validation::ValidProduct;

/// One element of the stored inventory.
///
/// Elements that don't fit `Product` (a string quantity, a missing price, a
/// numeric id, ...) are kept as raw JSON and written back untouched, so one
/// odd entry never costs the rest of the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Product(Product),
    Raw(Value),
}

impl Record {
    /// The record's id, if it has a string one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Record::Product(p) => Some(&p.id),
            Record::Raw(value) => value.get("id").and_then(Value::as_str),
        }
    }

    /// Applies a validated update and returns the result. A raw record keeps
    /// its id and unrelated fields and becomes a `Product`.
    pub fn apply(&mut self, fields: ValidProduct, extra: Extra) -> Product {
        match self {
            Record::Product(p) => {
                p.apply(fields, extra);
                p.clone()
            }
            Record::Raw(value) => {
                let mut stored: Extra = match value.take() {
                    Value::Object(map) => map.into_iter().collect(),
                    _ => Extra::new(),
                };
                let id = match stored.shift_remove("id") {
                    Some(Value::String(id)) => id,
                    _ => String::new(),
                };
                stored.retain(|key, _| !CORE_KEYS.contains(&key.as_str()));

                let mut product = Product::new(id, fields, stored);
                product.merge_extra(extra);
                *self = Record::Product(product.clone());
                product
            }
        }
    }
}

impl From<Product> for Record {
    fn from(product: Product) -> Self {
        Record::Product(product)
    }
}

// ── Id generation ────────────────────────────────────────────────────────────

/// Next record id: current Unix time in milliseconds, bumped past any id
/// already taken in `existing`.
pub fn next_id(existing: &[Record]) -> String {
    next_id_from(Utc::now().timestamp_millis(), existing)
}

fn next_id_from(mut millis: i64, existing: &[Record]) -> String {
    loop {
        let candidate = millis.to_string();
        if !existing.iter().any(|r| r.id() == Some(candidate.as_str())) {
            return candidate;
        }
        millis += 1;
    }
}
