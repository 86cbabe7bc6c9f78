//! # Customer API Handlers
//!
//! Tenant-scoped customer records, unique per `(tenant, email)`.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::types::{PaginatedResponse, resolve_page};
use crate::models::customer;
use crate::repositories::CustomerRepository;
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

/// Customer representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerDto {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[schema(example = "jo@example.com")]
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<customer::Model> for CustomerDto {
    fn from(model: customer::Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Request payload for creating a customer
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Request payload for updating a customer
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Query parameters for listing customers
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListCustomersQuery {
    pub limit: Option<u64>,
    pub cursor: Option<String>,
}

fn validate_email(email: &str) -> Result<String, ApiError> {
    let trimmed = email.trim().to_lowercase();
    let plausible = trimmed.len() <= 320
        && trimmed.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        });

    if !plausible {
        return Err(validation_error(
            "Invalid email address",
            serde_json::json!({ "email": "must be a plausible email address" }),
        ));
    }
    Ok(trimmed)
}

/// Create a customer
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    security(("bearer_auth" = [])),
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Email already registered for this tenant", body = ApiError)
    ),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerDto>), ApiError> {
    let email = validate_email(&request.email)?;

    let repo = CustomerRepository::new(Arc::new(state.db.clone()));
    let now = chrono::Utc::now();

    let customer = repo
        .create(customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            email: Set(email),
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            phone: Set(request.phone),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// Get a customer by ID
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "Customer found", body = CustomerDto),
        (status = 404, description = "Customer not found", body = ApiError)
    ),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerDto>, ApiError> {
    let repo = CustomerRepository::new(Arc::new(state.db.clone()));

    let customer = repo
        .find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Customer", id))?;

    Ok(Json(customer.into()))
}

/// List customers with cursor pagination
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    security(("bearer_auth" = [])),
    params(ListCustomersQuery),
    responses(
        (status = 200, description = "Customer page", body = PaginatedResponse<CustomerDto>),
        (status = 400, description = "Invalid cursor", body = ApiError)
    ),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(query): Query<ListCustomersQuery>,
) -> Result<Json<PaginatedResponse<CustomerDto>>, ApiError> {
    let (limit, cursor) = resolve_page(
        query.limit,
        query.cursor.as_deref(),
        &state.config.pagination,
    )?;

    let repo = CustomerRepository::new(Arc::new(state.db.clone()));
    let (rows, next_cursor) = repo.list_by_tenant(&tenant.0, limit, cursor).await?;

    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(CustomerDto::from).collect(),
        next_cursor,
    )))
}

/// Update a customer
#[utoipa::path(
    patch,
    path = "/api/v1/customers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer UUID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Customer not found", body = ApiError),
        (status = 409, description = "Email already registered for this tenant", body = ApiError)
    ),
    tag = "customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerDto>, ApiError> {
    let repo = CustomerRepository::new(Arc::new(state.db.clone()));

    repo.find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Customer", id))?;

    let mut update = customer::ActiveModel::default();
    if let Some(email) = request.email {
        update.email = Set(validate_email(&email)?);
    }
    if let Some(first_name) = request.first_name {
        update.first_name = Set(Some(first_name));
    }
    if let Some(last_name) = request.last_name {
        update.last_name = Set(Some(last_name));
    }
    if let Some(phone) = request.phone {
        update.phone = Set(Some(phone));
    }

    let customer = repo.update_by_id(&tenant.0, &id, update).await?;
    Ok(Json(customer.into()))
}

/// Delete a customer
#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found", body = ApiError),
        (status = 500, description = "Customer referenced by order history", body = ApiError)
    ),
    tag = "customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = CustomerRepository::new(Arc::new(state.db.clone()));

    repo.find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Customer", id))?;

    repo.delete_by_id(&tenant.0, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
