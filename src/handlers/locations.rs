//! # Location API Handlers
//!
//! Tenant-scoped restaurant location management.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::types::{PaginatedResponse, resolve_page};
use crate::models::location;
use crate::repositories::LocationRepository;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Location representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationDto {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[schema(example = "Downtown")]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<location::Model> for LocationDto {
    fn from(model: location::Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            name: model.name,
            address: model.address,
            phone: model.phone,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Request payload for creating a location
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateLocationRequest {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Request payload for updating a location
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

/// Query parameters for listing locations
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListLocationsQuery {
    pub limit: Option<u64>,
    pub cursor: Option<String>,
    /// Only return active locations
    #[serde(default)]
    pub active: bool,
}

fn validate_location_name(name: &str) -> Result<String, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > 255 {
        return Err(validation_error(
            "Invalid location name",
            serde_json::json!({ "name": "must be 1-255 characters" }),
        ));
    }
    Ok(trimmed.to_string())
}

/// Create a location
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    security(("bearer_auth" = [])),
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = LocationDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<LocationDto>), ApiError> {
    let name = validate_location_name(&request.name)?;

    let repo = LocationRepository::new(Arc::new(state.db.clone()));
    let now = chrono::Utc::now();

    let location = repo
        .create(location::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            name: Set(name),
            address: Set(request.address),
            phone: Set(request.phone),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(location.into())))
}

/// Get a location by ID
#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Location UUID")),
    responses(
        (status = 200, description = "Location found", body = LocationDto),
        (status = 404, description = "Location not found", body = ApiError)
    ),
    tag = "locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<LocationDto>, ApiError> {
    let repo = LocationRepository::new(Arc::new(state.db.clone()));

    let location = repo
        .find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Location", id))?;

    Ok(Json(location.into()))
}

/// List locations with cursor pagination
#[utoipa::path(
    get,
    path = "/api/v1/locations",
    security(("bearer_auth" = [])),
    params(ListLocationsQuery),
    responses(
        (status = 200, description = "Location page", body = PaginatedResponse<LocationDto>),
        (status = 400, description = "Invalid cursor", body = ApiError)
    ),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(query): Query<ListLocationsQuery>,
) -> Result<Json<PaginatedResponse<LocationDto>>, ApiError> {
    let (limit, cursor) = resolve_page(
        query.limit,
        query.cursor.as_deref(),
        &state.config.pagination,
    )?;

    let repo = LocationRepository::new(Arc::new(state.db.clone()));
    let (rows, next_cursor) = repo
        .list_by_tenant(&tenant.0, limit, cursor, query.active)
        .await?;

    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(LocationDto::from).collect(),
        next_cursor,
    )))
}

/// Update a location
#[utoipa::path(
    patch,
    path = "/api/v1/locations/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Location UUID")),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location updated", body = LocationDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Location not found", body = ApiError)
    ),
    tag = "locations"
)]
pub async fn update_location(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<Json<LocationDto>, ApiError> {
    let repo = LocationRepository::new(Arc::new(state.db.clone()));

    repo.find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Location", id))?;

    let mut update = location::ActiveModel::default();
    if let Some(name) = request.name {
        update.name = Set(validate_location_name(&name)?);
    }
    if let Some(address) = request.address {
        update.address = Set(Some(address));
    }
    if let Some(phone) = request.phone {
        update.phone = Set(Some(phone));
    }
    if let Some(is_active) = request.is_active {
        update.is_active = Set(is_active);
    }

    let location = repo.update_by_id(&tenant.0, &id, update).await?;
    Ok(Json(location.into()))
}

/// Delete a location
#[utoipa::path(
    delete,
    path = "/api/v1/locations/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Location UUID")),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 404, description = "Location not found", body = ApiError)
    ),
    tag = "locations"
)]
pub async fn delete_location(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = LocationRepository::new(Arc::new(state.db.clone()));

    repo.find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Location", id))?;

    repo.delete_by_id(&tenant.0, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
