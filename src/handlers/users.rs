//! # User API Handlers
//!
//! Staff account management. Password hashes are accepted pre-hashed from
//! the upstream identity service and never returned in responses.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::types::{PaginatedResponse, resolve_page};
use crate::models::user::{self, UserRole};
use crate::repositories::UserRepository;
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

/// User representation returned by the API; excludes the password hash
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    #[schema(example = "manager@pizza-palace.example")]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<user::Model> for UserDto {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            location_id: model.location_id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Request payload for creating a user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    /// Pre-hashed password
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub location_id: Option<Uuid>,
}

/// Request payload for updating a user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    pub location_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    pub limit: Option<u64>,
    pub cursor: Option<String>,
    /// Restrict to users with one role
    pub role: Option<UserRole>,
}

fn validate_email(email: &str) -> Result<String, ApiError> {
    let trimmed = email.trim().to_lowercase();
    // Just a shape check; real validation happens on delivery
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

/// Create a user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let email = validate_email(&request.email)?;

    if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
        return Err(validation_error(
            "Name is required",
            serde_json::json!({ "first_name": "required", "last_name": "required" }),
        ));
    }

    let repo = UserRepository::new(Arc::new(state.db.clone()));
    let now = chrono::Utc::now();

    let user = repo
        .create(user::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(Some(tenant.0)),
            location_id: Set(request.location_id),
            email: Set(email),
            password_hash: Set(request.password_hash),
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            role: Set(request.role),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User UUID")),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDto>, ApiError> {
    let repo = UserRepository::new(Arc::new(state.db.clone()));

    let user = repo
        .find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("User", id))?;

    Ok(Json(user.into()))
}

/// List users with cursor pagination
#[utoipa::path(
    get,
    path = "/api/v1/users",
    security(("bearer_auth" = [])),
    params(ListUsersQuery),
    responses(
        (status = 200, description = "User page", body = PaginatedResponse<UserDto>),
        (status = 400, description = "Invalid cursor", body = ApiError)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<PaginatedResponse<UserDto>>, ApiError> {
    let (limit, cursor) = resolve_page(
        query.limit,
        query.cursor.as_deref(),
        &state.config.pagination,
    )?;

    let repo = UserRepository::new(Arc::new(state.db.clone()));
    let (rows, next_cursor) = repo
        .list_by_tenant(&tenant.0, limit, cursor, query.role)
        .await?;

    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(UserDto::from).collect(),
        next_cursor,
    )))
}

/// Update a user
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User UUID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserDto>, ApiError> {
    let repo = UserRepository::new(Arc::new(state.db.clone()));

    repo.find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("User", id))?;

    let mut update = user::ActiveModel::default();
    if let Some(email) = request.email {
        update.email = Set(validate_email(&email)?);
    }
    if let Some(password_hash) = request.password_hash {
        update.password_hash = Set(password_hash);
    }
    if let Some(first_name) = request.first_name {
        update.first_name = Set(first_name);
    }
    if let Some(last_name) = request.last_name {
        update.last_name = Set(last_name);
    }
    if let Some(role) = request.role {
        update.role = Set(role);
    }
    if let Some(location_id) = request.location_id {
        update.location_id = Set(Some(location_id));
    }
    if let Some(is_active) = request.is_active {
        update.is_active = Set(is_active);
    }

    let user = repo.update_by_id(&tenant.0, &id, update).await?;
    Ok(Json(user.into()))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User UUID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = UserRepository::new(Arc::new(state.db.clone()));

    repo.find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("User", id))?;

    repo.delete_by_id(&tenant.0, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
