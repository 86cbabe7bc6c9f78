//! # Product API Handlers
//!
//! Tenant-scoped menu item management. Prices are integer minor currency
//! units, never floats.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::types::{PaginatedResponse, resolve_page};
use crate::models::product;
use crate::repositories::product::ProductFilter;
use crate::repositories::{CategoryRepository, OrderItemRepository, ProductRepository};
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

/// Product representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductDto {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub category_id: Uuid,
    #[schema(example = "Margherita")]
    pub name: String,
    pub description: Option<String>,
    /// Price in minor currency units (1250 = 12.50)
    #[schema(example = 1250)]
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub sort_order: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<product::Model> for ProductDto {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            category_id: model.category_id,
            name: model.name,
            description: model.description,
            price_cents: model.price_cents,
            image_url: model.image_url,
            is_available: model.is_available,
            sort_order: model.sort_order,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Request payload for creating a product
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub image_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// Request payload for updating a product
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Query parameters for listing products
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListProductsQuery {
    pub limit: Option<u64>,
    pub cursor: Option<String>,
    /// Restrict to one category
    pub category_id: Option<Uuid>,
    /// Only return available products
    #[serde(default)]
    pub available: bool,
}

fn validate_price(price_cents: i64) -> Result<i64, ApiError> {
    if price_cents < 0 {
        return Err(validation_error(
            "Invalid price",
            serde_json::json!({ "price_cents": "must not be negative" }),
        ));
    }
    Ok(price_cents)
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    security(("bearer_auth" = [])),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Category not found", body = ApiError)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductDto>), ApiError> {
    let name = request.name.trim().to_string();
    if name.is_empty() || name.len() > 255 {
        return Err(validation_error(
            "Invalid product name",
            serde_json::json!({ "name": "must be 1-255 characters" }),
        ));
    }
    let price_cents = validate_price(request.price_cents)?;

    let db = Arc::new(state.db.clone());

    // The FK would also catch this, but checking up front turns a foreign
    // category into a 404 instead of a 500.
    CategoryRepository::new(Arc::clone(&db))
        .find_by_id(&tenant.0, &request.category_id)
        .await?
        .ok_or_else(|| not_found("Category", request.category_id))?;

    let now = chrono::Utc::now();
    let product = ProductRepository::new(db)
        .create(product::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            category_id: Set(request.category_id),
            name: Set(name),
            description: Set(request.description),
            price_cents: Set(price_cents),
            image_url: Set(request.image_url),
            is_available: Set(true),
            sort_order: Set(request.sort_order),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductDto),
        (status = 404, description = "Product not found", body = ApiError)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductDto>, ApiError> {
    let repo = ProductRepository::new(Arc::new(state.db.clone()));

    let product = repo
        .find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Product", id))?;

    Ok(Json(product.into()))
}

/// List products with cursor pagination and filters
#[utoipa::path(
    get,
    path = "/api/v1/products",
    security(("bearer_auth" = [])),
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Product page", body = PaginatedResponse<ProductDto>),
        (status = 400, description = "Invalid cursor", body = ApiError)
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<PaginatedResponse<ProductDto>>, ApiError> {
    let (limit, cursor) = resolve_page(
        query.limit,
        query.cursor.as_deref(),
        &state.config.pagination,
    )?;

    let repo = ProductRepository::new(Arc::new(state.db.clone()));
    let (rows, next_cursor) = repo
        .list_by_tenant(
            &tenant.0,
            limit,
            cursor,
            ProductFilter {
                category_id: query.category_id,
                only_available: query.available,
            },
        )
        .await?;

    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(ProductDto::from).collect(),
        next_cursor,
    )))
}

/// Update a product
#[utoipa::path(
    patch,
    path = "/api/v1/products/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Product or category not found", body = ApiError)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ProductDto>, ApiError> {
    let db = Arc::new(state.db.clone());
    let repo = ProductRepository::new(Arc::clone(&db));

    repo.find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Product", id))?;

    let mut update = product::ActiveModel::default();
    if let Some(category_id) = request.category_id {
        CategoryRepository::new(Arc::clone(&db))
            .find_by_id(&tenant.0, &category_id)
            .await?
            .ok_or_else(|| not_found("Category", category_id))?;
        update.category_id = Set(category_id);
    }
    if let Some(name) = request.name {
        update.name = Set(name);
    }
    if let Some(description) = request.description {
        update.description = Set(Some(description));
    }
    if let Some(price_cents) = request.price_cents {
        update.price_cents = Set(validate_price(price_cents)?);
    }
    if let Some(image_url) = request.image_url {
        update.image_url = Set(Some(image_url));
    }
    if let Some(is_available) = request.is_available {
        update.is_available = Set(is_available);
    }
    if let Some(sort_order) = request.sort_order {
        update.sort_order = Set(sort_order);
    }

    let product = repo.update_by_id(&tenant.0, &id, update).await?;
    Ok(Json(product.into()))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = ApiError),
        (status = 409, description = "Product referenced by order history", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let db = Arc::new(state.db.clone());
    let repo = ProductRepository::new(Arc::clone(&db));

    repo.find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Product", id))?;

    // Order history keeps its line items; a sold product cannot be removed.
    let sold = OrderItemRepository::new(db)
        .list_by_product(&tenant.0, &id, 1)
        .await?;
    if !sold.is_empty() {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            "Product is referenced by existing orders",
        ));
    }

    repo.delete_by_id(&tenant.0, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
