//! # Tenant API Handlers
//!
//! Platform-level tenant management plus the per-tenant settings document.

use crate::auth::OperatorAuth;
use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::types::{PaginatedResponse, resolve_page};
use crate::models::tenant::{self, TenantStatus};
use crate::models::tenant_settings;
use crate::repositories::tenant_settings::SettingsUpdate;
use crate::repositories::{TenantRepository, TenantSettingsRepository};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Tenant representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantDto {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "Pizza Palace")]
    pub name: String,
    /// Unique subdomain the tenant's storefront lives under
    #[schema(example = "pizza-palace")]
    pub subdomain: String,
    pub status: TenantStatus,
    pub logo_url: Option<String>,
    #[schema(example = "2025-01-15T10:30:00Z")]
    pub created_at: String,
    pub updated_at: String,
}

impl From<tenant::Model> for TenantDto {
    fn from(model: tenant::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            subdomain: model.subdomain,
            status: model.status,
            logo_url: model.logo_url,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Request payload for creating a tenant
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTenantRequest {
    #[schema(example = "Pizza Palace")]
    pub name: String,
    #[schema(example = "pizza-palace")]
    pub subdomain: String,
    pub logo_url: Option<String>,
}

/// Request payload for updating a tenant; absent fields are left unchanged
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateTenantRequest {
    pub name: Option<String>,
    pub subdomain: Option<String>,
    pub status: Option<TenantStatus>,
    pub logo_url: Option<String>,
}

/// Tenant settings representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantSettingsDto {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// ISO 4217 currency code
    #[schema(example = "USD")]
    pub currency: String,
    /// Tax rate in basis points (875 = 8.75%)
    #[schema(example = 875)]
    pub tax_rate_bps: i32,
    pub delivery_fee_cents: i64,
    pub min_order_cents: Option<i64>,
    pub online_ordering_enabled: bool,
    pub delivery_enabled: bool,
    pub pickup_enabled: bool,
    pub updated_at: String,
}

impl From<tenant_settings::Model> for TenantSettingsDto {
    fn from(model: tenant_settings::Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            currency: model.currency,
            tax_rate_bps: model.tax_rate_bps,
            delivery_fee_cents: model.delivery_fee_cents,
            min_order_cents: model.min_order_cents,
            online_ordering_enabled: model.online_ordering_enabled,
            delivery_enabled: model.delivery_enabled,
            pickup_enabled: model.pickup_enabled,
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Request payload for upserting tenant settings
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct PutSettingsRequest {
    pub currency: Option<String>,
    pub tax_rate_bps: Option<i32>,
    pub delivery_fee_cents: Option<i64>,
    /// Set to null explicitly to clear the minimum
    #[serde(default, with = "double_option")]
    pub min_order_cents: Option<Option<i64>>,
    pub online_ordering_enabled: Option<bool>,
    pub delivery_enabled: Option<bool>,
    pub pickup_enabled: Option<bool>,
}

/// Distinguishes an absent field from an explicit null
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Some(Option::deserialize(deserializer)?))
    }
}

fn validate_name(name: &str) -> Result<String, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(validation_error(
            "Tenant name is required",
            serde_json::json!({ "name": "must not be empty" }),
        ));
    }
    if trimmed.len() > 255 {
        return Err(validation_error(
            "Tenant name exceeds maximum length",
            serde_json::json!({ "name": "must be at most 255 characters" }),
        ));
    }
    Ok(trimmed.to_string())
}

// Uppercase is rejected rather than normalized so the stored subdomain is
// exactly what the caller registered.
fn validate_subdomain(subdomain: &str) -> Result<String, ApiError> {
    let trimmed = subdomain.trim().to_string();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= 63
        && trimmed
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !trimmed.starts_with('-')
        && !trimmed.ends_with('-');

    if !valid {
        return Err(validation_error(
            "Invalid subdomain",
            serde_json::json!({
                "subdomain": "must be 1-63 lowercase alphanumeric characters or hyphens"
            }),
        ));
    }
    Ok(trimmed)
}

/// Create a new tenant
#[utoipa::path(
    post,
    path = "/api/v1/tenants",
    security(("bearer_auth" = [])),
    request_body = CreateTenantRequest,
    responses(
        (status = 201, description = "Tenant created", body = TenantDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Subdomain already taken", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn create_tenant(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Json(request): Json<CreateTenantRequest>,
) -> Result<(StatusCode, [(&'static str, String); 1], Json<TenantDto>), ApiError> {
    let name = validate_name(&request.name)?;
    let subdomain = validate_subdomain(&request.subdomain)?;

    let repo = TenantRepository::new(Arc::new(state.db.clone()));
    let now = chrono::Utc::now();

    let tenant = repo
        .create(tenant::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            subdomain: Set(subdomain),
            status: Set(TenantStatus::Active),
            logo_url: Set(request.logo_url),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        })
        .await?;

    let location = format!("/api/v1/tenants/{}", tenant.id);
    Ok((
        StatusCode::CREATED,
        [("Location", location)],
        Json(tenant.into()),
    ))
}

/// Get a tenant by ID
#[utoipa::path(
    get,
    path = "/api/v1/tenants/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Tenant UUID")),
    responses(
        (status = 200, description = "Tenant found", body = TenantDto),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn get_tenant(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<TenantDto>, ApiError> {
    let repo = TenantRepository::new(Arc::new(state.db.clone()));

    let tenant = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| not_found("Tenant", id))?;

    Ok(Json(tenant.into()))
}

/// Query parameters for listing tenants
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ListTenantsQuery {
    /// Maximum number of items to return
    pub limit: Option<u64>,
    /// Opaque cursor from a previous page's `next_cursor`
    pub cursor: Option<String>,
    /// Restrict to tenants in one status
    pub status: Option<TenantStatus>,
}

/// List tenants with cursor pagination
#[utoipa::path(
    get,
    path = "/api/v1/tenants",
    security(("bearer_auth" = [])),
    params(ListTenantsQuery),
    responses(
        (status = 200, description = "Tenant page", body = PaginatedResponse<TenantDto>),
        (status = 400, description = "Invalid cursor", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn list_tenants(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Query(query): Query<ListTenantsQuery>,
) -> Result<Json<PaginatedResponse<TenantDto>>, ApiError> {
    let (limit, cursor) = resolve_page(
        query.limit,
        query.cursor.as_deref(),
        &state.config.pagination,
    )?;

    let repo = TenantRepository::new(Arc::new(state.db.clone()));
    let (rows, next_cursor) = repo.list(limit, cursor, query.status).await?;

    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(TenantDto::from).collect(),
        next_cursor,
    )))
}

/// Update a tenant
#[utoipa::path(
    patch,
    path = "/api/v1/tenants/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Tenant UUID")),
    request_body = UpdateTenantRequest,
    responses(
        (status = 200, description = "Tenant updated", body = TenantDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError),
        (status = 409, description = "Subdomain already taken", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn update_tenant(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTenantRequest>,
) -> Result<Json<TenantDto>, ApiError> {
    let repo = TenantRepository::new(Arc::new(state.db.clone()));

    repo.find_by_id(&id)
        .await?
        .ok_or_else(|| not_found("Tenant", id))?;

    let mut update = tenant::ActiveModel::default();
    if let Some(name) = request.name {
        update.name = Set(validate_name(&name)?);
    }
    if let Some(subdomain) = request.subdomain {
        update.subdomain = Set(validate_subdomain(&subdomain)?);
    }
    if let Some(status) = request.status {
        update.status = Set(status);
    }
    if let Some(logo_url) = request.logo_url {
        update.logo_url = Set(Some(logo_url));
    }

    let tenant = repo.update_by_id(&id, update).await?;
    Ok(Json(tenant.into()))
}

/// Delete a tenant and everything it owns
#[utoipa::path(
    delete,
    path = "/api/v1/tenants/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Tenant UUID")),
    responses(
        (status = 204, description = "Tenant deleted"),
        (status = 404, description = "Tenant not found", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn delete_tenant(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = TenantRepository::new(Arc::new(state.db.clone()));

    repo.find_by_id(&id)
        .await?
        .ok_or_else(|| not_found("Tenant", id))?;

    repo.delete_by_id(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get the settings document of a tenant
#[utoipa::path(
    get,
    path = "/api/v1/tenants/{id}/settings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Tenant UUID")),
    responses(
        (status = 200, description = "Settings found", body = TenantSettingsDto),
        (status = 404, description = "Tenant or settings not found", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn get_settings(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<TenantSettingsDto>, ApiError> {
    let db = Arc::new(state.db.clone());

    TenantRepository::new(Arc::clone(&db))
        .find_by_id(&id)
        .await?
        .ok_or_else(|| not_found("Tenant", id))?;

    let settings = TenantSettingsRepository::new(db)
        .find_by_tenant(&id)
        .await?
        .ok_or_else(|| not_found("Tenant settings", id))?;

    Ok(Json(settings.into()))
}

/// Create or update the settings document of a tenant
#[utoipa::path(
    put,
    path = "/api/v1/tenants/{id}/settings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Tenant UUID")),
    request_body = PutSettingsRequest,
    responses(
        (status = 200, description = "Settings upserted", body = TenantSettingsDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn put_settings(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<PutSettingsRequest>,
) -> Result<Json<TenantSettingsDto>, ApiError> {
    if let Some(tax_rate_bps) = request.tax_rate_bps
        && !(0..=10_000).contains(&tax_rate_bps)
    {
        return Err(validation_error(
            "Invalid tax rate",
            serde_json::json!({ "tax_rate_bps": "must be between 0 and 10000" }),
        ));
    }
    if matches!(request.delivery_fee_cents, Some(fee) if fee < 0) {
        return Err(validation_error(
            "Invalid delivery fee",
            serde_json::json!({ "delivery_fee_cents": "must not be negative" }),
        ));
    }

    let db = Arc::new(state.db.clone());

    TenantRepository::new(Arc::clone(&db))
        .find_by_id(&id)
        .await?
        .ok_or_else(|| not_found("Tenant", id))?;

    let settings = TenantSettingsRepository::new(db)
        .upsert(
            &id,
            SettingsUpdate {
                currency: request.currency,
                tax_rate_bps: request.tax_rate_bps,
                delivery_fee_cents: request.delivery_fee_cents,
                min_order_cents: request.min_order_cents,
                online_ordering_enabled: request.online_ordering_enabled,
                delivery_enabled: request.delivery_enabled,
                pickup_enabled: request.pickup_enabled,
            },
        )
        .await?;

    Ok(Json(settings.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdomain_accepts_lowercase_alphanumerics_and_hyphens() {
        assert_eq!(validate_subdomain("pizza-palace").unwrap(), "pizza-palace");
        assert_eq!(validate_subdomain("  cafe9  ").unwrap(), "cafe9");
    }

    #[test]
    fn subdomain_rejects_uppercase_instead_of_normalizing() {
        assert!(validate_subdomain("Pizza-Palace").is_err());
    }

    #[test]
    fn subdomain_rejects_empty_and_edge_hyphens() {
        assert!(validate_subdomain("").is_err());
        assert!(validate_subdomain("-leading").is_err());
        assert!(validate_subdomain("trailing-").is_err());
        assert!(validate_subdomain(&"a".repeat(64)).is_err());
    }
}
