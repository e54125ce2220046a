use axum::extract::State;
use axum::Json;

use linus_core::{Permission, SystemSettings};

use crate::error::ApiResult;
use crate::routes::ApiJson;
use crate::state::{AppState, CurrentSession};

pub async fn show(State(state): State<AppState>, _session: CurrentSession) -> Json<SystemSettings> {
    Json(state.settings.current().await)
}

/// Replaces the whole settings record. Takes effect for the next cart
/// computation and low-stock scan.
pub async fn update(
    State(state): State<AppState>,
    session: CurrentSession,
    ApiJson(settings): ApiJson<SystemSettings>,
) -> ApiResult<Json<SystemSettings>> {
    session.require(Permission::ManageSettings)?;
    Ok(Json(state.settings.replace(settings).await?))
}
