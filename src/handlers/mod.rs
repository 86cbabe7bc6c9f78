//! # API Handlers
//!
//! HTTP endpoint handlers for the Orderdesk API.

use crate::models::ServiceInfo;
use crate::server::AppState;
use axum::extract::State;
use axum::response::Json;

pub mod categories;
pub mod customers;
pub mod locations;
pub mod orders;
pub mod products;
pub mod tenants;
pub mod types;
pub mod users;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness probe that also verifies database connectivity
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Database unreachable", body = crate::error::ApiError)
    ),
    tag = "root"
)]
pub async fn healthz(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, crate::error::ApiError> {
    crate::db::health_check(&state.db)
        .await
        .map_err(crate::error::ApiError::from)?;

    Ok(Json(serde_json::json!({ "status": "ok" })))
}
