//! Dashboard figures and the low-stock notification feed.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use linus_core::report::{self, DateRange, PeriodSummary};
use linus_core::stock::LowStockNotification;
use linus_core::{Money, Permission, Sale};

use crate::error::ApiResult;
use crate::routes::RangeQuery;
use crate::state::{AppState, CurrentSession};

/// One point of the revenue chart.
#[derive(Debug, Serialize)]
pub struct DayRevenue {
    pub date: NaiveDate,
    pub revenue: Money,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    #[serde(flatten)]
    pub summary: PeriodSummary,
    pub revenue_by_day: Vec<DayRevenue>,
}

#[derive(Debug, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub summary: PeriodSummary,
    pub sales: Vec<Sale>,
}

/// The set published by the last low-stock scan.
pub async fn notifications(
    State(state): State<AppState>,
    _session: CurrentSession,
) -> Json<Vec<LowStockNotification>> {
    Json(state.low_stock.current())
}

pub async fn summary(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<SummaryReport>> {
    session.require(Permission::ViewReports)?;
    let range = query.range()?;

    let sales = state.db.sales().list(&range).await?;
    let products = state.db.products().list().await?;
    let threshold = state.settings.current().await.low_stock_threshold;

    let sales: Vec<&Sale> = sales.iter().collect();
    let revenue_by_day = report::revenue_by_day(&sales)
        .into_iter()
        .map(|(date, revenue)| DayRevenue { date, revenue })
        .collect();

    Ok(Json(SummaryReport {
        summary: report::summarize(&sales, &products, threshold),
        revenue_by_day,
    }))
}

/// Today's figures, by the server's UTC calendar date.
pub async fn daily(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<Json<DailyReport>> {
    session.require(Permission::ViewReports)?;
    let today = Utc::now().date_naive();

    let sales = state
        .db
        .sales()
        .list(&DateRange::new(Some(today), None))
        .await?;
    let products = state.db.products().list().await?;
    let threshold = state.settings.current().await.low_stock_threshold;

    let todays = report::daily(&sales, today);
    let summary = report::summarize(&todays, &products, threshold);
    let sales = todays.into_iter().cloned().collect();

    Ok(Json(DailyReport {
        date: today,
        summary,
        sales,
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::app;
    use axum::http::{Method, StatusCode};
    use linus_core::stock;
    use linus_core::UserPermissions;
    use serde_json::json;

    fn sale(date: Option<&str>, lines: serde_json::Value) -> serde_json::Value {
        let mut body = json!({ "items": lines, "paymentMethod": "Cash" });
        if let Some(date) = date {
            body["date"] = json!(date);
        }
        body
    }

    #[tokio::test]
    async fn test_summary_over_range() {
        let app = app().await;
        let token = app.admin().await;
        let tea = json!([{ "productId": "p1", "productName": "Tea", "quantity": 2, "price": 10 }]);
        let sugar = json!([{ "productId": "p2", "productName": "Sugar", "quantity": 1, "price": 5 }]);
        for body in [
            sale(Some("2024-03-01T10:00:00Z"), tea),
            sale(Some("2024-03-02T10:00:00Z"), sugar),
        ] {
            let (status, _) = app.send(Method::POST, "/api/sales", Some(&token), Some(body)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, summary) = app
            .send(
                Method::GET,
                "/api/reports/summary?from=2024-03-01&to=2024-03-02",
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["saleCount"], 2);
        // 23.00 + 5.75
        assert_eq!(summary["revenue"], 28.75);
        assert_eq!(summary["averageTicket"], 14.37);
        assert_eq!(summary["topProduct"]["productId"], "p1");
        // Tea 8, Sugar 4 against the default threshold of 5.
        assert_eq!(summary["lowStockCount"], 1);
        assert_eq!(
            summary["revenueByDay"],
            json!([
                { "date": "2024-03-01", "revenue": 23.0 },
                { "date": "2024-03-02", "revenue": 5.75 }
            ])
        );

        let (_, empty) = app
            .send(Method::GET, "/api/reports/summary?from=2030-01-01", Some(&token), None)
            .await;
        assert_eq!(empty["saleCount"], 0);
        assert_eq!(empty["averageTicket"], 0.0);
        assert!(empty["topProduct"].is_null());
    }

    #[tokio::test]
    async fn test_daily_only_counts_today() {
        let app = app().await;
        let token = app.admin().await;
        let line = json!([{ "productId": "p1", "productName": "Tea", "quantity": 1, "price": 10 }]);
        app.send(Method::POST, "/api/sales", Some(&token), Some(sale(None, line.clone())))
            .await;
        app.send(
            Method::POST,
            "/api/sales",
            Some(&token),
            Some(sale(Some("2024-03-01T10:00:00Z"), line)),
        )
        .await;

        let (status, daily) = app.send(Method::GET, "/api/reports/daily", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(daily["saleCount"], 1);
        assert_eq!(daily["sales"].as_array().unwrap().len(), 1);
        assert_eq!(daily["revenue"], 11.5);
    }

    #[tokio::test]
    async fn test_notifications_and_report_permissions() {
        let app = app().await;
        app.add_user("sara", "pw", UserPermissions::none()).await;
        let token = app.login("sara", "pw").await;

        let (_, set) = app.send(Method::GET, "/api/notifications", Some(&token), None).await;
        assert!(set.as_array().unwrap().is_empty());

        let products = app.state.db.products().list().await.unwrap();
        app.state.low_stock.publish(stock::scan(&products, 5));
        let (status, set) = app.send(Method::GET, "/api/notifications", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(set[0]["productId"], "p2");
        assert_eq!(set[0]["threshold"], 5);

        let (status, _) = app.send(Method::GET, "/api/reports/summary", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send(Method::GET, "/api/reports/daily", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.send(Method::GET, "/api/notifications", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
