//! # Order API Handlers
//!
//! Order intake, lifecycle transitions and tenant-level order statistics.

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::types::{PaginatedResponse, resolve_page};
use crate::models::order::{
    self, OrderSource, OrderStatus, OrderType, PaymentMethod, PaymentStatus,
};
use crate::models::order_item;
use crate::repositories::customer::CustomerContact;
use crate::repositories::order::{
    CreateOrder, NewOrderItem, OrderCreationError, OrderFilter, RevenueSummary, StatusCount,
};
use crate::repositories::{CustomerRepository, OrderRepository};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Order line item representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemDto {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Product name snapshot taken at order time
    #[schema(example = "Margherita")]
    pub product_name: String,
    pub unit_price_cents: i64,
    pub quantity: i32,
    pub line_total_cents: i64,
    pub notes: Option<String>,
}

impl From<order_item::Model> for OrderItemDto {
    fn from(model: order_item::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            product_name: model.product_name,
            unit_price_cents: model.unit_price_cents,
            quantity: model.quantity,
            line_total_cents: model.line_total_cents,
            notes: model.notes,
        }
    }
}

/// Order representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDto {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub location_id: Option<Uuid>,
    pub customer_id: Uuid,
    #[schema(example = "ORD-7K2M9QRX")]
    pub order_number: String,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub source: OrderSource,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub delivery_fee_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub placed_at: String,
    pub created_at: String,
    pub updated_at: String,
    /// Line items, present on create and single-order reads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItemDto>>,
}

impl OrderDto {
    fn from_model(model: order::Model, items: Option<Vec<order_item::Model>>) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            location_id: model.location_id,
            customer_id: model.customer_id,
            order_number: model.order_number,
            status: model.status,
            order_type: model.order_type,
            source: model.source,
            payment_method: model.payment_method,
            payment_status: model.payment_status,
            subtotal_cents: model.subtotal_cents,
            tax_cents: model.tax_cents,
            delivery_fee_cents: model.delivery_fee_cents,
            total_cents: model.total_cents,
            notes: model.notes,
            placed_at: model.placed_at.to_rfc3339(),
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
            items: items.map(|items| items.into_iter().map(OrderItemDto::from).collect()),
        }
    }
}

impl From<order::Model> for OrderDto {
    fn from(model: order::Model) -> Self {
        Self::from_model(model, None)
    }
}

/// Customer identification for order intake: an existing ID or contact
/// details to upsert by email
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderCustomer {
    pub id: Option<Uuid>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// One requested line item
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    #[schema(example = 2)]
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Request payload for creating an order
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer: OrderCustomer,
    pub location_id: Option<Uuid>,
    pub order_type: OrderType,
    pub source: OrderSource,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

/// Request payload for a status transition
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Request payload for a payment status change
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

/// Query parameters for listing orders
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListOrdersQuery {
    pub limit: Option<u64>,
    pub cursor: Option<String>,
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub payment_status: Option<PaymentStatus>,
    pub customer_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    /// Inclusive lower bound on placed_at (RFC 3339)
    pub placed_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on placed_at (RFC 3339)
    pub placed_to: Option<DateTime<Utc>>,
}

/// Query parameters for order statistics
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OrderStatsQuery {
    pub placed_from: Option<DateTime<Utc>>,
    pub placed_to: Option<DateTime<Utc>>,
}

/// Combined statistics payload for a tenant's orders
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStatsDto {
    pub status_counts: Vec<StatusCount>,
    pub revenue: RevenueSummary,
}

fn map_creation_error(err: OrderCreationError) -> ApiError {
    match err {
        OrderCreationError::EmptyOrder | OrderCreationError::NonPositiveQuantity => {
            validation_error(&err.to_string(), serde_json::json!({ "items": "invalid" }))
        }
        OrderCreationError::ProductNotFound(id) => not_found("Product", id),
        OrderCreationError::ProductUnavailable(_)
        | OrderCreationError::BelowMinimum { .. }
        | OrderCreationError::OrderTypeDisabled(_) => ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "ORDER_REJECTED",
            err.to_string(),
        ),
        OrderCreationError::OrderNumberExhausted => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Could not allocate an order number",
        ),
        OrderCreationError::Db(db_err) => db_err.into(),
    }
}

async fn resolve_customer(
    repo: &CustomerRepository,
    tenant_id: &Uuid,
    customer: OrderCustomer,
) -> Result<Uuid, ApiError> {
    if let Some(id) = customer.id {
        let existing = repo
            .find_by_id(tenant_id, &id)
            .await?
            .ok_or_else(|| not_found("Customer", id))?;
        return Ok(existing.id);
    }

    let Some(email) = customer.email else {
        return Err(validation_error(
            "Customer is required",
            serde_json::json!({ "customer": "provide either id or email" }),
        ));
    };

    let upserted = repo
        .upsert_by_email(
            tenant_id,
            email.trim().to_lowercase().as_str(),
            CustomerContact {
                first_name: customer.first_name,
                last_name: customer.last_name,
                phone: customer.phone,
            },
        )
        .await?;

    Ok(upserted.id)
}

/// Create an order with its line items
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    security(("bearer_auth" = [])),
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Customer or product not found", body = ApiError),
        (status = 422, description = "Order rejected by tenant rules", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderDto>), ApiError> {
    let db = Arc::new(state.db.clone());

    let customer_repo = CustomerRepository::new(Arc::clone(&db));
    let customer_id = resolve_customer(&customer_repo, &tenant.0, request.customer).await?;

    let repo = OrderRepository::new(db);
    let (order, items) = repo
        .create_with_items(
            &tenant.0,
            CreateOrder {
                customer_id,
                location_id: request.location_id,
                order_type: request.order_type,
                source: request.source,
                payment_method: request.payment_method,
                notes: request.notes,
                items: request
                    .items
                    .into_iter()
                    .map(|item| NewOrderItem {
                        product_id: item.product_id,
                        quantity: item.quantity,
                        notes: item.notes,
                    })
                    .collect(),
            },
        )
        .await
        .map_err(map_creation_error)?;

    tracing::info!(
        tenant_id = %tenant.0,
        order_number = %order.order_number,
        total_cents = order.total_cents,
        "Order created"
    );

    Ok((
        StatusCode::CREATED,
        Json(OrderDto::from_model(order, Some(items))),
    ))
}

/// Get an order with its line items
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderDto),
        (status = 404, description = "Order not found", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDto>, ApiError> {
    let repo = OrderRepository::new(Arc::new(state.db.clone()));

    let (order, items) = repo
        .find_with_items(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Order", id))?;

    Ok(Json(OrderDto::from_model(order, Some(items))))
}

/// List orders with cursor pagination and filters
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    security(("bearer_auth" = [])),
    params(ListOrdersQuery),
    responses(
        (status = 200, description = "Order page", body = PaginatedResponse<OrderDto>),
        (status = 400, description = "Invalid cursor", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<PaginatedResponse<OrderDto>>, ApiError> {
    let (limit, cursor) = resolve_page(
        query.limit,
        query.cursor.as_deref(),
        &state.config.pagination,
    )?;

    let repo = OrderRepository::new(Arc::new(state.db.clone()));
    let (rows, next_cursor) = repo
        .list_by_tenant(
            &tenant.0,
            limit,
            cursor,
            OrderFilter {
                status: query.status,
                order_type: query.order_type,
                payment_status: query.payment_status,
                customer_id: query.customer_id,
                location_id: query.location_id,
                placed_from: query.placed_from,
                placed_to: query.placed_to,
            },
        )
        .await?;

    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(OrderDto::from).collect(),
        next_cursor,
    )))
}

/// Order statistics: per-status counts and revenue over paid orders
#[utoipa::path(
    get,
    path = "/api/v1/orders/stats",
    security(("bearer_auth" = [])),
    params(OrderStatsQuery),
    responses(
        (status = 200, description = "Order statistics", body = OrderStatsDto)
    ),
    tag = "orders"
)]
pub async fn order_stats(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Query(query): Query<OrderStatsQuery>,
) -> Result<Json<OrderStatsDto>, ApiError> {
    let repo = OrderRepository::new(Arc::new(state.db.clone()));

    let status_counts = repo.status_counts(&tenant.0).await?;
    let revenue = repo
        .revenue_summary(&tenant.0, query.placed_from, query.placed_to)
        .await?;

    Ok(Json(OrderStatsDto {
        status_counts,
        revenue,
    }))
}

/// Move an order to a new fulfilment status
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/status",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderDto),
        (status = 404, description = "Order not found", body = ApiError),
        (status = 409, description = "Order is in a terminal status", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderDto>, ApiError> {
    let repo = OrderRepository::new(Arc::new(state.db.clone()));

    let existing = repo
        .find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Order", id))?;

    if matches!(
        existing.status,
        OrderStatus::Completed | OrderStatus::Cancelled
    ) && existing.status != request.status
    {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            "Order is in a terminal status and cannot change",
        ));
    }

    let order = repo
        .update_status(&tenant.0, &id, request.status)
        .await?;

    Ok(Json(order.into()))
}

/// Update the payment status of an order
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/payment",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Payment status updated", body = OrderDto),
        (status = 404, description = "Order not found", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn update_payment_status(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<OrderDto>, ApiError> {
    let repo = OrderRepository::new(Arc::new(state.db.clone()));

    repo.find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Order", id))?;

    let order = repo
        .update_payment_status(&tenant.0, &id, request.payment_status)
        .await?;

    Ok(Json(order.into()))
}

/// Delete an order and its line items
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = OrderRepository::new(Arc::new(state.db.clone()));

    repo.find_by_id(&tenant.0, &id)
        .await?
        .ok_or_else(|| not_found("Order", id))?;

    repo.delete_by_id(&tenant.0, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
