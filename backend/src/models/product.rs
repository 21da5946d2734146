use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::validation::ValidProduct;

/// Extra fields carried alongside the validated ones, in arrival order.
pub type Extra = IndexMap<String, Value>;

/// Keys owned by `Product` itself; never taken from a body's extension fields.
pub const CORE_KEYS: &[&str] = &["id", "name", "quantity", "price"];

/// One inventory record as stored on disk and returned by the API.
///
/// `quantity` and `price` keep the exact JSON number the client sent, so a
/// `5` stays `5` rather than coming back as `5.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub quantity: Number,
    pub price: Number,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Product {
    pub fn new(id: String, fields: ValidProduct, extra: Extra) -> Self {
        Self {
            id,
            name: fields.name,
            quantity: fields.quantity,
            price: fields.price,
            extra,
        }
    }

    /// Overwrites the validated fields and shallow-merges `extra` over the
    /// stored extension fields. The id never changes.
    pub fn apply(&mut self, fields: ValidProduct, extra: Extra) {
        self.name = fields.name;
        self.quantity = fields.quantity;
        self.price = fields.price;
        self.merge_extra(extra);
    }

    pub fn merge_extra(&mut self, extra: Extra) {
        for (key, value) in extra {
            self.extra.insert(key, value);
        }
    }
}

// ── Request payload ──────────────────────────────────────────────────────────

/// Body of create and update requests, kept as the raw JSON object so the
/// validator sees every field whatever its type. Anything other than an
/// object counts as a body with no fields.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProductInput {
    fields: Map<String, Value>,
}

impl ProductInput {
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Consumes the input, returning the fields that are not core keys.
    pub fn into_extra(self) -> Extra {
        self.fields
            .into_iter()
            .filter(|(key, _)| !CORE_KEYS.contains(&key.as_str()))
            .collect()
    }
}
