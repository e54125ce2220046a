//! Held invoices: list, restore into the session cart, discard.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use linus_core::{held, CoreError, HeldInvoice, Money};

use crate::error::ApiResult;
use crate::routes::cart::CartView;
use crate::state::{AppState, CurrentSession};

#[derive(Debug, Serialize)]
pub struct HeldInvoiceView {
    #[serde(flatten)]
    pub invoice: HeldInvoice,
    /// At the tax rate in force now.
    pub total: Money,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreQuery {
    #[serde(default)]
    pub confirm_override: bool,
}

pub async fn list(
    State(state): State<AppState>,
    _session: CurrentSession,
) -> ApiResult<Json<Vec<HeldInvoiceView>>> {
    let rate = state.settings.current().await.tax_rate;
    let mut invoices = state.db.held_invoices().list().await?;
    held::sort_newest_first(&mut invoices);

    let views = invoices
        .into_iter()
        .map(|invoice| {
            Ok(HeldInvoiceView {
                total: invoice.total(rate)?,
                invoice,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;
    Ok(Json(views))
}

/// `POST /api/held-invoices/{id}/restore?confirmOverride=true`
///
/// A non-empty cart without the override is refused with `CONFLICT` and
/// nothing changes. Stock is not re-checked.
pub async fn restore(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    Query(query): Query<RestoreQuery>,
) -> ApiResult<Json<CartView>> {
    let mut cart = session.cart().await;
    held::ensure_restorable(&cart, query.confirm_override)?;

    let invoice = state.db.held_invoices().take(&id).await?;
    held::restore(&mut cart, invoice);
    state.signal.notify("held-restore");
    info!(id = %id, lines = cart.item_count(), "Held invoice restored");

    let rate = state.settings.current().await.tax_rate;
    Ok(Json(CartView::new(&cart, rate)?))
}

pub async fn discard(
    State(state): State<AppState>,
    _session: CurrentSession,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.held_invoices().delete(&id).await?;
    info!(id = %id, "Held invoice discarded");
    Ok(StatusCode::NO_CONTENT)
}
