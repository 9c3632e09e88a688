use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::db::HealthCheckResult;
use crate::state::{AppState, StoreBackend};

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    store: StoreBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<HealthCheckResult>,
    uptime: u64,
    start_time: String,
    timestamp: String,
}

async fn health(State(state): State<AppState>) -> Response {
    let database = match state.db_proxy() {
        Some(proxy) => Some(proxy.health_check().await),
        None => None,
    };
    let healthy = database.as_ref().map(|d| d.healthy).unwrap_or(true);

    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        store: state.store_backend(),
        database,
        uptime: state.uptime_seconds(),
        start_time: DateTime::<Utc>::from(state.started_at_system())
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}
