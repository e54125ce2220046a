//! # Cart Routes
//!
//! The session cart and the two ways out of it: checkout and hold.
//!
//! ## Checkout
//! ```text
//! POST /api/cart/checkout {paymentMethod, customerName, paymentDetails, discount}
//!   │
//!   ├── begin_checkout()      second request while in flight ──► 409 CONFLICT
//!   ├── lock cart             (held until the commit resolves)
//!   ├── prepare_sale()        empty cart ──► 400, totals at current tax rate
//!   ├── SaleRepository::commit(sale, policy)
//!   │        failure ──► rollback, cart untouched, COMMIT_FAILED
//!   ├── clear cart
//!   └── notify("sale") ──► 201 Sale
//! ```
//!
//! `POST /api/cart/items` takes `{productId}` or, from a scanner,
//! `{barcode}`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use linus_core::cart::{compute_totals, QuantityChange};
use linus_core::checkout::{prepare_sale, TenderDetails};
use linus_core::{
    held, Cart, CartItem, CoreError, HeldInvoice, Sale, TaxRate, Totals, ValidationError,
};

use crate::error::{ApiError, ApiResult};
use crate::routes::ApiJson;
use crate::state::{AppState, CurrentSession};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: usize,
    pub total_quantity: i64,
    #[serde(flatten)]
    pub totals: Totals,
}

impl CartView {
    pub fn new(cart: &Cart, rate: TaxRate) -> Result<Self, CoreError> {
        Ok(CartView {
            items: cart.items().to_vec(),
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            totals: compute_totals(cart.items(), rate)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Option<String>,
    pub barcode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub delta: i64,
}

#[derive(Debug, Serialize)]
pub struct QuantityResponse {
    pub change: QuantityChange,
    pub cart: CartView,
}

async fn view(state: &AppState, cart: &Cart) -> ApiResult<CartView> {
    Ok(CartView::new(cart, state.settings.current().await.tax_rate)?)
}

pub async fn show(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<Json<CartView>> {
    let cart = session.cart().await;
    Ok(Json(view(&state, &cart).await?))
}

pub async fn clear(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<Json<CartView>> {
    let mut cart = session.cart().await;
    cart.clear();
    Ok(Json(view(&state, &cart).await?))
}

/// Adds one unit of a stored product, found by id or by barcode. The id
/// wins when both are sent.
pub async fn add_item(
    State(state): State<AppState>,
    session: CurrentSession,
    ApiJson(request): ApiJson<AddItemRequest>,
) -> ApiResult<Json<CartView>> {
    let products = state.db.products();
    let product = match (request.product_id, request.barcode) {
        (Some(id), _) => products
            .get(&id)
            .await?
            .ok_or(CoreError::ProductNotFound(id))?,
        (None, Some(barcode)) => products
            .find_by_barcode(&barcode)
            .await?
            .ok_or(CoreError::ProductNotFound(barcode))?,
        (None, None) => return Err(ValidationError::required("productId").into()),
    };

    let mut cart = session.cart().await;
    cart.add_item(&product)?;
    Ok(Json(view(&state, &cart).await?))
}

/// Applies a quantity delta against the product's current stored stock,
/// falling back to the line's snapshot when the product is gone.
pub async fn change_quantity(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<QuantityRequest>,
) -> ApiResult<Json<QuantityResponse>> {
    let known_stock = state.db.products().get(&id).await?.map(|p| p.stock);

    let mut cart = session.cart().await;
    let change = cart.change_quantity(&id, request.delta, known_stock)?;
    Ok(Json(QuantityResponse {
        change,
        cart: view(&state, &cart).await?,
    }))
}

pub async fn remove_item(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> ApiResult<Json<CartView>> {
    let mut cart = session.cart().await;
    cart.remove_item(&id);
    Ok(Json(view(&state, &cart).await?))
}

pub async fn checkout(
    State(state): State<AppState>,
    session: CurrentSession,
    ApiJson(tender): ApiJson<TenderDetails>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let _guard = session.begin_checkout()?;
    let mut cart = session.cart().await;

    let settings = state.settings.current().await;
    let sale = prepare_sale(
        &cart,
        &settings,
        &session.user().name,
        tender,
        Uuid::new_v4().to_string(),
        Utc::now(),
    )?;

    if let Err(e) = state.db.sales().commit(&sale, state.stock_policy).await {
        warn!(id = %sale.id, error = %e, "Checkout failed");
        return Err(ApiError::commit_failed(e));
    }

    cart.clear();
    drop(cart);
    state.signal.notify("sale");
    info!(id = %sale.id, total = %sale.total, status = ?sale.status, "Sale completed");

    Ok((StatusCode::CREATED, Json(sale)))
}

/// Parks the cart as a held invoice and empties it.
pub async fn hold(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<(StatusCode, Json<HeldInvoice>)> {
    let mut cart = session.cart().await;
    let invoice = held::hold(&mut cart, Uuid::new_v4().to_string(), Utc::now())?;

    if let Err(e) = state.db.held_invoices().insert(&invoice).await {
        *cart = Cart::from_items(invoice.items);
        return Err(e.into());
    }

    info!(id = %invoice.id, lines = invoice.items.len(), "Cart held");
    Ok((StatusCode::CREATED, Json(invoice)))
}
