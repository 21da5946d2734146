use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    models::{next_id, Product, ProductInput, Record},
    validation::validate,
    AppState,
};

const NOT_FOUND: &str = "Item not found";

// ── Body ──────────────────────────────────────────────────────────────────────

/// Reads a create/update body as raw JSON so validation sees it before any
/// typing. A body that isn't labelled JSON, or is empty, has no fields.
#[async_trait]
impl<S> FromRequest<S> for ProductInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = has_json_content_type(req.headers());
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        if !is_json || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Request body is not valid JSON: {e}")))?;
        Ok(Self::from_json(value))
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_inventory(State(state): State<AppState>) -> Json<Vec<Record>> {
    let inventory = state.store.read().await;
    debug!(count = inventory.len(), "Listed inventory");
    Json(inventory)
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_item(
    State(state): State<AppState>,
    input: ProductInput,
) -> AppResult<(StatusCode, Json<Product>)> {
    let fields = validate(&input)?;

    let _guard = state.write_lock.lock().await;
    let mut inventory = state.store.read().await;
    let product = Product::new(next_id(&inventory), fields, input.into_extra());
    inventory.push(product.clone().into());
    state.store.write(&inventory).await?;

    info!(id = %product.id, name = %product.name, count = inventory.len(), "Created item");

    Ok((StatusCode::CREATED, Json(product)))
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    input: ProductInput,
) -> AppResult<Json<Product>> {
    let fields = validate(&input)?;

    let _guard = state.write_lock.lock().await;
    let mut inventory = state.store.read().await;
    let Some(record) = inventory.iter_mut().find(|r| r.id() == Some(id.as_str())) else {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    };
    let updated = record.apply(fields, input.into_extra());
    state.store.write(&inventory).await?;

    info!(id = %updated.id, name = %updated.name, "Updated item");

    Ok(Json(updated))
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let _guard = state.write_lock.lock().await;
    let mut inventory = state.store.read().await;
    let before = inventory.len();
    inventory.retain(|r| r.id() != Some(id.as_str()));

    if inventory.len() == before {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }
    state.store.write(&inventory).await?;

    info!(id = %id, removed = before - inventory.len(), "Deleted item");

    Ok(StatusCode::NO_CONTENT)
}
