//! # Category API Handlers
//!
//! Tenant-scoped menu category management. Slugs are unique per tenant.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::types::{PaginatedResponse, resolve_page};
use crate::models::category;
use crate::repositories::CategoryRepository;
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

/// Category representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryDto {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[schema(example = "Pizzas")]
    pub name: String,
    #[schema(example = "pizzas")]
    pub slug: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<category::Model> for CategoryDto {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            sort_order: model.sort_order,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Request payload for creating a category
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    /// Defaults to a slugified form of the name when absent
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// Request payload for updating a category
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Query parameters for listing categories
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListCategoriesQuery {
    pub limit: Option<u64>,
    pub cursor: Option<String>,
    /// Only return active categories
    #[serde(default)]
    pub active: bool,
}

/// Lowercases and collapses a display name into a URL-safe slug
fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_was_hyphen = true;

    for c in input.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    slug.trim_end_matches('-').to_string()
}

fn validate_slug(slug: &str) -> Result<String, ApiError> {
    let trimmed = slug.trim().to_lowercase();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= 100
        && trimmed
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !trimmed.starts_with('-')
        && !trimmed.ends_with('-');

    if !valid {
        return Err(validation_error(
            "Invalid slug",
            serde_json::json!({
                "slug": "must be 1-100 lowercase alphanumeric characters or hyphens"
            }),
        ));
    }
    Ok(trimmed)
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    security(("bearer_auth" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Slug already used by this tenant", body = ApiError)
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryDto>), ApiError> {
    let name = request.name.trim().to_string();
    if name.is_empty() || name.len() > 255 {
        return Err(validation_error(
            "Invalid category name",
            serde_json::json!({ "name": "must be 1-255 characters" }),
        ));
    }

    let slug = match request.slug {
        Some(slug) => validate_slug(&slug)?,
        None => {
            let derived = slugify(&name);
            if derived.is_empty() {
                return Err(validation_error(
                    "Cannot derive slug from name",
                    serde_json::json!({ "slug": "provide one explicitly" }),
                ));
            }
            derived
        }
    };

    let repo = CategoryRepository::new(Arc::new(state.db.clone()));
    let now = chrono::Utc::now();

    let cat = repo
        .create(category::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            name: Set(name),
            slug: Set(slug),
            description: Set(request.description),
            sort_order: Set(request.sort_order),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(cat.into())))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Category UUID")),
    responses(
        (status = 200, description = "Category found", body = CategoryDto),
        (status = 404, description = "Category not found", body = ApiError)
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryDto>, ApiError> {
    let repo = CategoryRepository::new(Arc::new(state.db.clone()));

    let cat = repo
        .find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Category", id))?;

    Ok(Json(cat.into()))
}

/// List categories with cursor pagination
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    security(("bearer_auth" = [])),
    params(ListCategoriesQuery),
    responses(
        (status = 200, description = "Category page", body = PaginatedResponse<CategoryDto>),
        (status = 400, description = "Invalid cursor", body = ApiError)
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<PaginatedResponse<CategoryDto>>, ApiError> {
    let (limit, cursor) = resolve_page(
        query.limit,
        query.cursor.as_deref(),
        &state.config.pagination,
    )?;

    let repo = CategoryRepository::new(Arc::new(state.db.clone()));
    let (rows, next_cursor) = repo
        .list_by_tenant(&tenant.0, limit, cursor, query.active)
        .await?;

    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(CategoryDto::from).collect(),
        next_cursor,
    )))
}

/// Update a category
#[utoipa::path(
    patch,
    path = "/api/v1/categories/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Category UUID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Category not found", body = ApiError),
        (status = 409, description = "Slug already used by this tenant", body = ApiError)
    ),
    tag = "categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryDto>, ApiError> {
    let repo = CategoryRepository::new(Arc::new(state.db.clone()));

    repo.find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Category", id))?;

    let mut update = category::ActiveModel::default();
    if let Some(name) = request.name {
        update.name = Set(name);
    }
    if let Some(slug) = request.slug {
        update.slug = Set(validate_slug(&slug)?);
    }
    if let Some(description) = request.description {
        update.description = Set(Some(description));
    }
    if let Some(sort_order) = request.sort_order {
        update.sort_order = Set(sort_order);
    }
    if let Some(is_active) = request.is_active {
        update.is_active = Set(is_active);
    }

    let cat = repo.update_by_id(&tenant.0, &id, update).await?;
    Ok(Json(cat.into()))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Category UUID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ApiError),
        (status = 500, description = "Category still has products", body = ApiError)
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = CategoryRepository::new(Arc::new(state.db.clone()));

    repo.find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Category", id))?;

    repo.delete_by_id(&tenant.0, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_normalizes_names() {
        assert_eq!(slugify("Wood-Fired Pizzas"), "wood-fired-pizzas");
        assert_eq!(slugify("  Sides & Salads  "), "sides-salads");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify("Desserts!"), "desserts");
    }

    #[test]
    fn validate_slug_rejects_bad_input() {
        assert!(validate_slug("pizzas").is_ok());
        assert!(validate_slug("wood-fired").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("trailing-").is_err());
        assert!(validate_slug("has space").is_err());
        assert!(validate_slug(&"x".repeat(101)).is_err());
    }
}
