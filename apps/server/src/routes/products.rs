//! Product catalogue and inventory view.
//!
//! Writes require `ManageInventory` and raise the change signal so the
//! low-stock set is rebuilt.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use linus_core::stock::{inventory_rows, InventoryRow};
use linus_core::validation::validate_product;
use linus_core::{Permission, Product};

use crate::error::ApiResult;
use crate::routes::ApiJson;
use crate::state::{AppState, CurrentSession};

/// A single product or a batch; both save through one transaction.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProductPayload {
    Many(Vec<Product>),
    One(Product),
}

impl ProductPayload {
    fn into_vec(self) -> Vec<Product> {
        match self {
            ProductPayload::Many(products) => products,
            ProductPayload::One(product) => vec![product],
        }
    }
}

/// Search results are capped at this many rows.
const SEARCH_LIMIT: i64 = 50;

/// `GET /api/products?q=` matches names containing `q` and barcodes
/// starting with it. No `q` lists the whole catalogue.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SavedCount {
    pub saved: usize,
}

#[derive(Debug, Serialize)]
pub struct RemovedCount {
    pub removed: u64,
}

pub async fn list(
    State(state): State<AppState>,
    _session: CurrentSession,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = state.db.products();
    match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => Ok(Json(products.search(q, SEARCH_LIMIT).await?)),
        None => Ok(Json(products.list().await?)),
    }
}

pub async fn upsert(
    State(state): State<AppState>,
    session: CurrentSession,
    ApiJson(payload): ApiJson<ProductPayload>,
) -> ApiResult<Json<SavedCount>> {
    session.require(Permission::ManageInventory)?;

    let products = payload.into_vec();
    for product in &products {
        validate_product(product)?;
    }

    let saved = state.db.products().upsert_many(&products).await?;
    state.signal.notify("products");
    info!(saved, by = %session.user().username, "Products saved");

    Ok(Json(SavedCount { saved }))
}

pub async fn delete_one(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    session.require(Permission::ManageInventory)?;

    state.db.products().delete(&id).await?;
    state.signal.notify("products");
    info!(id = %id, by = %session.user().username, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_all(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<Json<RemovedCount>> {
    session.require(Permission::ManageInventory)?;

    let removed = state.db.products().delete_all().await?;
    state.signal.notify("products");
    info!(removed, by = %session.user().username, "Inventory cleared");

    Ok(Json(RemovedCount { removed }))
}

/// Products with the `isLowStock` flag (`stock < threshold`).
pub async fn inventory(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<Json<Vec<InventoryRow>>> {
    session.require(Permission::ManageInventory)?;

    let threshold = state.settings.current().await.low_stock_threshold;
    let products = state.db.products().list().await?;
    Ok(Json(inventory_rows(products, threshold)))
}
