//! # Routes
//!
//! REST surface of the server. Every handler returns `ApiResult<T>`; bodies
//! are camelCase JSON except the exports, which return CSV or HTML.
//!
//! | Module | Paths |
//! |---|---|
//! | [`health`] | `/api/health` |
//! | [`auth`] | `/api/login`, `/api/logout` |
//! | [`products`] | `/api/products`, `/api/inventory` |
//! | [`cart`] | `/api/cart`, `/api/cart/items`, `/api/cart/checkout`, `/api/cart/hold` |
//! | [`held`] | `/api/held-invoices` |
//! | [`sales`] | `/api/sales` |
//! | [`users`] | `/api/users` |
//! | [`settings`] | `/api/settings` |
//! | [`reports`] | `/api/reports/*`, `/api/notifications` |
//! | [`exports`] | `/api/exports/*` |

pub mod auth;
pub mod cart;
pub mod exports;
pub mod health;
pub mod held;
pub mod products;
pub mod reports;
pub mod sales;
pub mod settings;
pub mod users;

use axum::extract::{FromRequest, Request};
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route(
            "/api/products",
            get(products::list)
                .post(products::upsert)
                .delete(products::delete_all),
        )
        .route("/api/products/{id}", delete(products::delete_one))
        .route("/api/inventory", get(products::inventory))
        .route("/api/cart", get(cart::show).delete(cart::clear))
        .route("/api/cart/items", post(cart::add_item))
        .route(
            "/api/cart/items/{id}",
            patch(cart::change_quantity).delete(cart::remove_item),
        )
        .route("/api/cart/checkout", post(cart::checkout))
        .route("/api/cart/hold", post(cart::hold))
        .route("/api/held-invoices", get(held::list))
        .route("/api/held-invoices/{id}", delete(held::discard))
        .route("/api/held-invoices/{id}/restore", post(held::restore))
        .route("/api/sales", get(sales::list).post(sales::append))
        .route("/api/sales/{id}/receipt", get(sales::receipt))
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/{username}/toggle", put(users::toggle_active))
        .route("/api/settings", get(settings::show).put(settings::update))
        .route("/api/notifications", get(reports::notifications))
        .route("/api/reports/summary", get(reports::summary))
        .route("/api/reports/daily", get(reports::daily))
        .route("/api/exports/inventory.csv", get(exports::inventory_csv))
        .route("/api/exports/inventory.html", get(exports::inventory_html))
        .route("/api/exports/sales.csv", get(exports::sales_csv))
        .route("/api/exports/sales.html", get(exports::sales_html))
}

/// `Json<T>` whose rejection is an [`ApiError`] (`VALIDATION_ERROR`)
/// instead of axum's plain-text 4xx.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD`, both optional.
#[derive(Debug, Default, serde::Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RangeQuery {
    pub fn range(&self) -> Result<linus_core::report::DateRange, ApiError> {
        linus_core::report::DateRange::parse(self.from.as_deref(), self.to.as_deref())
            .map_err(ApiError::from)
    }
}

// =============================================================================
// Test Support
// =============================================================================
