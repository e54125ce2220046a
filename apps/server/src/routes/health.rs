//! `GET /api/health`: database reachability and migration state. Open to
//! everyone; answers 503 when the store is down.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use linus_db::migrations::migration_status;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub database: bool,
    pub migrations_total: usize,
    pub migrations_applied: usize,
    pub sessions: usize,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let database = state.db.health_check().await;
    let (total, applied) = if database {
        migration_status(state.db.pool()).await.unwrap_or((0, 0))
    } else {
        (0, 0)
    };

    let status = if database { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let report = HealthReport {
        status: if database { "ok" } else { "unavailable" },
        database,
        migrations_total: total,
        migrations_applied: applied,
        sessions: state.sessions.len().await,
    };

    (status, Json(report))
}
