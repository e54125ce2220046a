//! Sales ledger: list by date range, direct append, printable receipt.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use linus_core::checkout::rebuild_sale;
use linus_core::export::receipt_html;
use linus_core::{Currency, Money, PaymentMethod, Permission, Sale, SaleLine, SaleStatus};

use crate::error::{ApiError, ApiResult};
use crate::routes::{ApiJson, RangeQuery};
use crate::state::{AppState, CurrentSession};

/// A sale as submitted by a client. Any totals, status or cashier in the
/// payload are ignored and derived server-side.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleSubmission {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub items: Vec<SaleLine>,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_details: String,
}

impl SaleSubmission {
    fn into_sale(self, cashier: &str) -> Sale {
        Sale {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            date: self.date.unwrap_or_else(Utc::now),
            items: self.items,
            subtotal: Money::zero(),
            tax: Money::zero(),
            discount: self.discount,
            total: Money::zero(),
            currency: Currency::default(),
            cashier: cashier.to_string(),
            customer_name: self.customer_name,
            payment_method: self.payment_method,
            payment_details: self.payment_details,
            status: SaleStatus::for_payment(self.payment_method),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<Vec<Sale>>> {
    session.require(Permission::ViewReports)?;
    let range = query.range()?;
    Ok(Json(state.db.sales().list(&range).await?))
}

/// Appends a sale through the same atomic commit as checkout.
pub async fn append(
    State(state): State<AppState>,
    session: CurrentSession,
    ApiJson(submission): ApiJson<SaleSubmission>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let settings = state.settings.current().await;
    let sale = rebuild_sale(submission.into_sale(&session.user().name), &settings)?;

    state
        .db
        .sales()
        .commit(&sale, state.stock_policy)
        .await
        .map_err(ApiError::commit_failed)?;

    state.signal.notify("sale");
    info!(id = %sale.id, total = %sale.total, "Sale appended");
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn receipt(
    State(state): State<AppState>,
    _session: CurrentSession,
    Path(id): Path<String>,
) -> ApiResult<Html<String>> {
    let sale = state
        .db
        .sales()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &id))?;

    let store_name = state.settings.current().await.store_name;
    Ok(Html(receipt_html(&sale, &store_name)))
}
