//! CSV downloads and printable HTML reports.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};

use linus_core::export;
use linus_core::{Permission, Sale};

use crate::error::ApiResult;
use crate::routes::RangeQuery;
use crate::state::{AppState, CurrentSession};

const INVENTORY_PERMISSIONS: [Permission; 2] = [Permission::ManageInventory, Permission::ViewReports];

fn csv_attachment(filename: &'static str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, filename),
        ],
        body,
    )
        .into_response()
}

pub async fn inventory_csv(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<Response> {
    session.require_any(&INVENTORY_PERMISSIONS)?;
    let products = state.db.products().list().await?;
    Ok(csv_attachment(
        "attachment; filename=\"inventory.csv\"",
        export::inventory_csv(&products),
    ))
}

pub async fn inventory_html(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<Html<String>> {
    session.require_any(&INVENTORY_PERMISSIONS)?;
    let products = state.db.products().list().await?;
    let settings = state.settings.current().await;
    Ok(Html(export::inventory_html(&products, &settings)))
}

pub async fn sales_csv(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Response> {
    session.require(Permission::ViewReports)?;
    let sales = state.db.sales().list(&query.range()?).await?;
    let sales: Vec<&Sale> = sales.iter().collect();
    Ok(csv_attachment(
        "attachment; filename=\"sales.csv\"",
        export::sales_csv(&sales),
    ))
}

pub async fn sales_html(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Html<String>> {
    session.require(Permission::ViewReports)?;
    let range = query.range()?;
    let sales = state.db.sales().list(&range).await?;
    let sales: Vec<&Sale> = sales.iter().collect();
    let settings = state.settings.current().await;
    Ok(Html(export::period_html(&sales, range, &settings)))
}
