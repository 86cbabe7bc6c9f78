//! Order repository
//!
//! Order intake is transactional: the order row and its line items are
//! written together, with totals computed server-side from product price
//! snapshots and the tenant's settings. Client-supplied amounts are never
//! trusted.

use anyhow::{Result, anyhow, bail};
use thiserror::Error;
use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::cursor::{CursorData, encode_cursor};
use crate::models::order::{
    self, Entity as Order, OrderSource, OrderStatus, OrderType, PaymentMethod, PaymentStatus,
};
use crate::models::order_item::{self, Entity as OrderItem};
use crate::models::product::{self, Entity as Product};
use crate::models::tenant_settings::{self, Entity as TenantSettings};

const ORDER_NUMBER_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ORDER_NUMBER_LEN: usize = 8;

/// Errors from transactional order creation that callers need to tell apart
#[derive(Debug, Error)]
pub enum OrderCreationError {
    #[error("order must contain at least one item")]
    EmptyOrder,
    #[error("item quantity must be positive")]
    NonPositiveQuantity,
    #[error("product '{0}' not found for tenant")]
    ProductNotFound(Uuid),
    #[error("product '{0}' is not available")]
    ProductUnavailable(String),
    #[error("order subtotal {subtotal_cents} is below the tenant minimum of {min_cents}")]
    BelowMinimum { subtotal_cents: i64, min_cents: i64 },
    #[error("{0} orders are disabled for this tenant")]
    OrderTypeDisabled(&'static str),
    #[error("could not allocate a unique order number")]
    OrderNumberExhausted,
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

/// One requested line item for [`OrderRepository::create_with_items`]
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Parameters for transactional order creation
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub customer_id: Uuid,
    pub location_id: Option<Uuid>,
    pub order_type: OrderType,
    pub source: OrderSource,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// Filters accepted by [`OrderRepository::list_by_tenant`]
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub payment_status: Option<PaymentStatus>,
    pub customer_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub placed_from: Option<DateTime<Utc>>,
    pub placed_to: Option<DateTime<Utc>>,
}

/// Per-status order counts for a tenant
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

/// Revenue aggregate over paid orders
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct RevenueSummary {
    pub order_count: u64,
    pub total_cents: i64,
    pub average_order_cents: i64,
}

/// Repository for order database operations
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pub db: Arc<DatabaseConnection>,
}

impl OrderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates an order together with its line items in one transaction.
    ///
    /// Product names and unit prices are snapshotted into the items, totals
    /// are derived from those snapshots plus the tenant settings, and the
    /// whole write rolls back if any product is missing or unavailable.
    pub async fn create_with_items(
        &self,
        tenant_id: &Uuid,
        params: CreateOrder,
    ) -> Result<(order::Model, Vec<order_item::Model>), OrderCreationError> {
        if params.items.is_empty() {
            return Err(OrderCreationError::EmptyOrder);
        }
        if params.items.iter().any(|item| item.quantity <= 0) {
            return Err(OrderCreationError::NonPositiveQuantity);
        }

        let txn = self.db.begin().await?;

        let settings = TenantSettings::find()
            .filter(tenant_settings::Column::TenantId.eq(*tenant_id))
            .one(&txn)
            .await?;

        let mut subtotal_cents: i64 = 0;
        let mut item_rows = Vec::with_capacity(params.items.len());

        for item in &params.items {
            let product = Product::find_by_id(item.product_id)
                .filter(product::Column::TenantId.eq(*tenant_id))
                .one(&txn)
                .await?
                .ok_or(OrderCreationError::ProductNotFound(item.product_id))?;

            if !product.is_available {
                return Err(OrderCreationError::ProductUnavailable(product.name));
            }

            let line_total = product.price_cents * i64::from(item.quantity);
            subtotal_cents += line_total;

            item_rows.push((product, item.quantity, item.notes.clone(), line_total));
        }

        let tax_rate_bps = settings.as_ref().map(|s| s.tax_rate_bps).unwrap_or(0);
        let delivery_fee_cents = match params.order_type {
            OrderType::Delivery => settings
                .as_ref()
                .map(|s| s.delivery_fee_cents)
                .unwrap_or(0),
            _ => 0,
        };

        if let Some(min) = settings.as_ref().and_then(|s| s.min_order_cents)
            && subtotal_cents < min
        {
            return Err(OrderCreationError::BelowMinimum {
                subtotal_cents,
                min_cents: min,
            });
        }

        if let Some(settings) = settings.as_ref() {
            match params.order_type {
                OrderType::Delivery if !settings.delivery_enabled => {
                    return Err(OrderCreationError::OrderTypeDisabled("delivery"));
                }
                OrderType::Pickup if !settings.pickup_enabled => {
                    return Err(OrderCreationError::OrderTypeDisabled("pickup"));
                }
                _ => {}
            }
        }

        // Round half up on the integer math so totals stay deterministic
        let tax_cents = (subtotal_cents * i64::from(tax_rate_bps) + 5000) / 10000;
        let total_cents = subtotal_cents + tax_cents + delivery_fee_cents;

        let order_number = self.generate_order_number(tenant_id, &txn).await?;

        let order_id = Uuid::new_v4();
        let now = Utc::now();

        order::ActiveModel {
            id: Set(order_id),
            tenant_id: Set(*tenant_id),
            location_id: Set(params.location_id),
            customer_id: Set(params.customer_id),
            order_number: Set(order_number),
            status: Set(OrderStatus::Pending),
            order_type: Set(params.order_type),
            source: Set(params.source),
            payment_method: Set(params.payment_method),
            payment_status: Set(PaymentStatus::Pending),
            subtotal_cents: Set(subtotal_cents),
            tax_cents: Set(tax_cents),
            delivery_fee_cents: Set(delivery_fee_cents),
            total_cents: Set(total_cents),
            notes: Set(params.notes),
            placed_at: Set(now.into()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        for (product, quantity, notes, line_total) in item_rows {
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product.id),
                product_name: Set(product.name),
                unit_price_cents: Set(product.price_cents),
                quantity: Set(quantity),
                line_total_cents: Set(line_total),
                notes: Set(notes),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await?;
        }

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| sea_orm::DbErr::RecordNotFound("order not persisted".to_string()))?;
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .order_by_asc(order_item::Column::Id)
            .all(&txn)
            .await?;

        txn.commit().await?;

        Ok((order, items))
    }

    async fn generate_order_number<C: ConnectionTrait>(
        &self,
        tenant_id: &Uuid,
        conn: &C,
    ) -> Result<String, OrderCreationError> {
        // Collisions are unlikely at 36^8 per tenant but the unique index
        // makes them fatal, so probe a few times before giving up.
        for _ in 0..5 {
            let candidate = {
                let mut rng = rand::thread_rng();
                let suffix: String = (0..ORDER_NUMBER_LEN)
                    .map(|_| {
                        let idx = rng.gen_range(0..ORDER_NUMBER_CHARSET.len());
                        ORDER_NUMBER_CHARSET[idx] as char
                    })
                    .collect();
                format!("ORD-{}", suffix)
            };

            let taken = Order::find()
                .filter(order::Column::TenantId.eq(*tenant_id))
                .filter(order::Column::OrderNumber.eq(candidate.clone()))
                .one(conn)
                .await?
                .is_some();

            if !taken {
                return Ok(candidate);
            }
        }

        Err(OrderCreationError::OrderNumberExhausted)
    }

    /// Finds an order by ID within a tenant scope
    pub async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<order::Model>> {
        Ok(Order::find_by_id(*id)
            .filter(order::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?)
    }

    /// Finds an order by its unique `(tenant, order_number)` pair
    pub async fn find_by_order_number(
        &self,
        tenant_id: &Uuid,
        order_number: &str,
    ) -> Result<Option<order::Model>> {
        Ok(Order::find()
            .filter(order::Column::TenantId.eq(*tenant_id))
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(&*self.db)
            .await?)
    }

    /// Finds an order and its line items within a tenant scope
    pub async fn find_with_items(
        &self,
        tenant_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<(order::Model, Vec<order_item::Model>)>> {
        let Some(order) = self.find_by_id(tenant_id, id).await? else {
            return Ok(None);
        };

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::CreatedAt)
            .order_by_asc(order_item::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(Some((order, items)))
    }

    /// Moves an order to a new fulfilment status.
    ///
    /// Completed and cancelled orders are terminal and reject further
    /// status changes.
    pub async fn update_status(
        &self,
        tenant_id: &Uuid,
        id: &Uuid,
        status: OrderStatus,
    ) -> Result<order::Model> {
        let existing = Order::find_by_id(*id)
            .filter(order::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("Order with ID '{}' not found for tenant", id))?;

        if matches!(
            existing.status,
            OrderStatus::Completed | OrderStatus::Cancelled
        ) && existing.status != status
        {
            bail!(
                "order '{}' is already {:?} and cannot change status",
                existing.order_number,
                existing.status
            );
        }

        let mut model: order::ActiveModel = existing.into();
        model.status = Set(status);
        model.updated_at = Set(Utc::now().into());

        Ok(model.update(&*self.db).await?)
    }

    /// Updates the payment status of an order
    pub async fn update_payment_status(
        &self,
        tenant_id: &Uuid,
        id: &Uuid,
        payment_status: PaymentStatus,
    ) -> Result<order::Model> {
        let existing = Order::find_by_id(*id)
            .filter(order::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("Order with ID '{}' not found for tenant", id))?;

        let mut model: order::ActiveModel = existing.into();
        model.payment_status = Set(payment_status);
        model.updated_at = Set(Utc::now().into());

        Ok(model.update(&*self.db).await?)
    }

    /// Deletes an order within a tenant scope; line items cascade
    pub async fn delete_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<()> {
        let result = Order::delete_by_id(*id)
            .filter(order::Column::TenantId.eq(*tenant_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(anyhow!("Order with ID '{}' not found for tenant", id));
        }

        Ok(())
    }

    fn apply_filter(
        mut query: sea_orm::Select<Order>,
        filter: &OrderFilter,
    ) -> sea_orm::Select<Order> {
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(order_type) = filter.order_type {
            query = query.filter(order::Column::OrderType.eq(order_type));
        }
        if let Some(payment_status) = filter.payment_status {
            query = query.filter(order::Column::PaymentStatus.eq(payment_status));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(order::Column::CustomerId.eq(customer_id));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(order::Column::LocationId.eq(location_id));
        }
        if let Some(placed_from) = filter.placed_from {
            query = query.filter(order::Column::PlacedAt.gte(placed_from));
        }
        if let Some(placed_to) = filter.placed_to {
            query = query.filter(order::Column::PlacedAt.lt(placed_to));
        }
        query
    }

    /// Lists orders for a tenant with cursor pagination and filters
    pub async fn list_by_tenant(
        &self,
        tenant_id: &Uuid,
        limit: u64,
        cursor: Option<CursorData>,
        filter: OrderFilter,
    ) -> Result<(Vec<order::Model>, Option<String>)> {
        if limit == 0 {
            return Ok((Vec::new(), None));
        }

        let mut query = Self::apply_filter(
            Order::find().filter(order::Column::TenantId.eq(*tenant_id)),
            &filter,
        )
        .order_by_asc(order::Column::CreatedAt)
        .order_by_asc(order::Column::Id);

        if let Some(cursor) = cursor {
            let condition = Condition::any()
                .add(order::Column::CreatedAt.gt(cursor.created_at))
                .add(
                    Condition::all()
                        .add(order::Column::CreatedAt.eq(cursor.created_at))
                        .add(order::Column::Id.gt(cursor.id)),
                );
            query = query.filter(condition);
        }

        let mut rows = query.limit(limit + 1).all(&*self.db).await?;

        let next_cursor = if rows.len() as u64 > limit {
            rows.pop();
            rows.last()
                .map(|last| encode_cursor(&last.created_at.to_utc(), &last.id))
        } else {
            None
        };

        Ok((rows, next_cursor))
    }

    /// Counts orders per status for a tenant
    pub async fn status_counts(&self, tenant_id: &Uuid) -> Result<Vec<StatusCount>> {
        let rows: Vec<(OrderStatus, i64)> = Order::find()
            .select_only()
            .column(order::Column::Status)
            .column_as(
                Expr::col(order::Column::Id).count().cast_as(Alias::new("bigint")),
                "count",
            )
            .filter(order::Column::TenantId.eq(*tenant_id))
            .group_by(order::Column::Status)
            .into_tuple()
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(status, count)| StatusCount {
                status,
                count: count.max(0) as u64,
            })
            .collect())
    }

    /// Aggregates revenue over paid orders for a tenant, optionally within a
    /// placed_at window
    pub async fn revenue_summary(
        &self,
        tenant_id: &Uuid,
        placed_from: Option<DateTime<Utc>>,
        placed_to: Option<DateTime<Utc>>,
    ) -> Result<RevenueSummary> {
        let mut query = Order::find()
            .select_only()
            .column_as(
                Expr::col(order::Column::Id).count().cast_as(Alias::new("bigint")),
                "order_count",
            )
            .column_as(
                Expr::col(order::Column::TotalCents)
                    .sum()
                    .cast_as(Alias::new("bigint")),
                "total_cents",
            )
            .filter(order::Column::TenantId.eq(*tenant_id))
            .filter(order::Column::PaymentStatus.eq(PaymentStatus::Paid));

        if let Some(placed_from) = placed_from {
            query = query.filter(order::Column::PlacedAt.gte(placed_from));
        }
        if let Some(placed_to) = placed_to {
            query = query.filter(order::Column::PlacedAt.lt(placed_to));
        }

        let row: Option<(i64, Option<i64>)> = query.into_tuple().one(&*self.db).await?;
        let (order_count, total_cents) = row.unwrap_or((0, None));
        let order_count = order_count.max(0) as u64;
        let total_cents = total_cents.unwrap_or(0);

        // Average computed here instead of in SQL to keep the row decode
        // integer-only on both backends.
        let average_order_cents = if order_count > 0 {
            total_cents / order_count as i64
        } else {
            0
        };

        Ok(RevenueSummary {
            order_count,
            total_cents,
            average_order_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        category,
        tenant::{self, TenantStatus},
    };
    use crate::repositories::{CustomerRepository, TenantSettingsRepository};
    use crate::repositories::customer::CustomerContact;
    use crate::repositories::tenant_settings::SettingsUpdate;
    use migration::Migrator;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    struct Fixture {
        db: Arc<DatabaseConnection>,
        tenant_id: Uuid,
        customer_id: Uuid,
        margherita_id: Uuid,
        calzone_id: Uuid,
    }

    async fn setup() -> Fixture {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let db = Arc::new(db);

        let now = Utc::now();
        let tenant_id = Uuid::new_v4();
        tenant::ActiveModel {
            id: Set(tenant_id),
            name: Set("Test Tenant".to_string()),
            subdomain: Set("test-tenant".to_string()),
            status: Set(TenantStatus::Active),
            logo_url: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&*db)
        .await
        .unwrap();

        let category_id = Uuid::new_v4();
        category::ActiveModel {
            id: Set(category_id),
            tenant_id: Set(tenant_id),
            name: Set("Pizzas".to_string()),
            slug: Set("pizzas".to_string()),
            description: Set(None),
            sort_order: Set(0),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&*db)
        .await
        .unwrap();

        let margherita_id = Uuid::new_v4();
        product::ActiveModel {
            id: Set(margherita_id),
            tenant_id: Set(tenant_id),
            category_id: Set(category_id),
            name: Set("Margherita".to_string()),
            description: Set(None),
            price_cents: Set(1000),
            image_url: Set(None),
            is_available: Set(true),
            sort_order: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&*db)
        .await
        .unwrap();

        let calzone_id = Uuid::new_v4();
        product::ActiveModel {
            id: Set(calzone_id),
            tenant_id: Set(tenant_id),
            category_id: Set(category_id),
            name: Set("Calzone".to_string()),
            description: Set(None),
            price_cents: Set(1500),
            image_url: Set(None),
            is_available: Set(true),
            sort_order: Set(1),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&*db)
        .await
        .unwrap();

        let customer = CustomerRepository::new(Arc::clone(&db))
            .upsert_by_email(&tenant_id, "jo@example.com", CustomerContact::default())
            .await
            .unwrap();

        Fixture {
            db,
            tenant_id,
            customer_id: customer.id,
            margherita_id,
            calzone_id,
        }
    }

    fn order_params(fixture: &Fixture, order_type: OrderType) -> CreateOrder {
        CreateOrder {
            customer_id: fixture.customer_id,
            location_id: None,
            order_type,
            source: OrderSource::Web,
            payment_method: PaymentMethod::Card,
            notes: None,
            items: vec![
                NewOrderItem {
                    product_id: fixture.margherita_id,
                    quantity: 2,
                    notes: Some("extra basil".to_string()),
                },
                NewOrderItem {
                    product_id: fixture.calzone_id,
                    quantity: 1,
                    notes: None,
                },
            ],
        }
    }

    #[tokio::test]
    async fn create_with_items_computes_totals() {
        let fixture = setup().await;
        let repo = OrderRepository::new(Arc::clone(&fixture.db));

        // 8.75% tax, 3.99 delivery fee
        TenantSettingsRepository::new(Arc::clone(&fixture.db))
            .upsert(
                &fixture.tenant_id,
                SettingsUpdate {
                    tax_rate_bps: Some(875),
                    delivery_fee_cents: Some(399),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let (order, items) = repo
            .create_with_items(&fixture.tenant_id, order_params(&fixture, OrderType::Delivery))
            .await
            .unwrap();

        // 2 * 1000 + 1 * 1500
        assert_eq!(order.subtotal_cents, 3500);
        // 3500 * 0.0875 = 306.25, rounded half up
        assert_eq!(order.tax_cents, 306);
        assert_eq!(order.delivery_fee_cents, 399);
        assert_eq!(order.total_cents, 4205);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(order.order_number.starts_with("ORD-"));
        assert_eq!(order.order_number.len(), 12);

        assert_eq!(items.len(), 2);
        let margherita = items
            .iter()
            .find(|i| i.product_id == fixture.margherita_id)
            .unwrap();
        assert_eq!(margherita.product_name, "Margherita");
        assert_eq!(margherita.unit_price_cents, 1000);
        assert_eq!(margherita.line_total_cents, 2000);
    }

    #[tokio::test]
    async fn pickup_orders_skip_delivery_fee() {
        let fixture = setup().await;
        let repo = OrderRepository::new(Arc::clone(&fixture.db));

        TenantSettingsRepository::new(Arc::clone(&fixture.db))
            .upsert(
                &fixture.tenant_id,
                SettingsUpdate {
                    delivery_fee_cents: Some(399),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let (order, _) = repo
            .create_with_items(&fixture.tenant_id, order_params(&fixture, OrderType::Pickup))
            .await
            .unwrap();

        assert_eq!(order.delivery_fee_cents, 0);
        assert_eq!(order.total_cents, order.subtotal_cents + order.tax_cents);
    }

    #[tokio::test]
    async fn unavailable_product_rolls_back() {
        let fixture = setup().await;
        let repo = OrderRepository::new(Arc::clone(&fixture.db));

        let mut model: product::ActiveModel = Product::find_by_id(fixture.calzone_id)
            .one(&*fixture.db)
            .await
            .unwrap()
            .unwrap()
            .into();
        model.is_available = Set(false);
        model.update(&*fixture.db).await.unwrap();

        let result = repo
            .create_with_items(&fixture.tenant_id, order_params(&fixture, OrderType::Pickup))
            .await;
        assert!(result.is_err());

        // Nothing was written
        assert_eq!(
            Order::find().all(&*fixture.db).await.unwrap().len(),
            0
        );
        assert_eq!(OrderItem::find().all(&*fixture.db).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn empty_and_nonpositive_items_rejected() {
        let fixture = setup().await;
        let repo = OrderRepository::new(Arc::clone(&fixture.db));

        let mut params = order_params(&fixture, OrderType::Pickup);
        params.items.clear();
        assert!(
            repo.create_with_items(&fixture.tenant_id, params)
                .await
                .is_err()
        );

        let mut params = order_params(&fixture, OrderType::Pickup);
        params.items[0].quantity = 0;
        assert!(
            repo.create_with_items(&fixture.tenant_id, params)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn minimum_order_enforced() {
        let fixture = setup().await;
        let repo = OrderRepository::new(Arc::clone(&fixture.db));

        TenantSettingsRepository::new(Arc::clone(&fixture.db))
            .upsert(
                &fixture.tenant_id,
                SettingsUpdate {
                    min_order_cents: Some(Some(5000)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = repo
            .create_with_items(&fixture.tenant_id, order_params(&fixture, OrderType::Pickup))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn status_transitions_respect_terminal_states() {
        let fixture = setup().await;
        let repo = OrderRepository::new(Arc::clone(&fixture.db));

        let (order, _) = repo
            .create_with_items(&fixture.tenant_id, order_params(&fixture, OrderType::Pickup))
            .await
            .unwrap();

        let confirmed = repo
            .update_status(&fixture.tenant_id, &order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        repo.update_status(&fixture.tenant_id, &order.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        let reopened = repo
            .update_status(&fixture.tenant_id, &order.id, OrderStatus::Preparing)
            .await;
        assert!(reopened.is_err());
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let fixture = setup().await;
        let repo = OrderRepository::new(Arc::clone(&fixture.db));

        for _ in 0..3 {
            repo.create_with_items(&fixture.tenant_id, order_params(&fixture, OrderType::Pickup))
                .await
                .unwrap();
        }
        let (delivery, _) = repo
            .create_with_items(&fixture.tenant_id, order_params(&fixture, OrderType::Delivery))
            .await
            .unwrap();

        let (page, next) = repo
            .list_by_tenant(&fixture.tenant_id, 2, None, OrderFilter::default())
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert!(next.is_some());

        let (deliveries, _) = repo
            .list_by_tenant(
                &fixture.tenant_id,
                10,
                None,
                OrderFilter {
                    order_type: Some(OrderType::Delivery),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].id, delivery.id);
    }

    #[tokio::test]
    async fn stats_cover_status_counts_and_revenue() {
        let fixture = setup().await;
        let repo = OrderRepository::new(Arc::clone(&fixture.db));

        let (first, _) = repo
            .create_with_items(&fixture.tenant_id, order_params(&fixture, OrderType::Pickup))
            .await
            .unwrap();
        let (second, _) = repo
            .create_with_items(&fixture.tenant_id, order_params(&fixture, OrderType::Pickup))
            .await
            .unwrap();

        repo.update_status(&fixture.tenant_id, &first.id, OrderStatus::Completed)
            .await
            .unwrap();
        repo.update_payment_status(&fixture.tenant_id, &first.id, PaymentStatus::Paid)
            .await
            .unwrap();
        repo.update_payment_status(&fixture.tenant_id, &second.id, PaymentStatus::Paid)
            .await
            .unwrap();

        let counts = repo.status_counts(&fixture.tenant_id).await.unwrap();
        let completed = counts
            .iter()
            .find(|c| c.status == OrderStatus::Completed)
            .unwrap();
        assert_eq!(completed.count, 1);
        let pending = counts
            .iter()
            .find(|c| c.status == OrderStatus::Pending)
            .unwrap();
        assert_eq!(pending.count, 1);

        let revenue = repo
            .revenue_summary(&fixture.tenant_id, None, None)
            .await
            .unwrap();
        assert_eq!(revenue.order_count, 2);
        assert_eq!(revenue.total_cents, first.total_cents + second.total_cents);
        assert_eq!(
            revenue.average_order_cents,
            (first.total_cents + second.total_cents) / 2
        );
    }

    #[tokio::test]
    async fn revenue_empty_when_nothing_paid() {
        let fixture = setup().await;
        let repo = OrderRepository::new(Arc::clone(&fixture.db));

        repo.create_with_items(&fixture.tenant_id, order_params(&fixture, OrderType::Pickup))
            .await
            .unwrap();

        let revenue = repo
            .revenue_summary(&fixture.tenant_id, None, None)
            .await
            .unwrap();
        assert_eq!(revenue.order_count, 0);
        assert_eq!(revenue.total_cents, 0);
        assert_eq!(revenue.average_order_cents, 0);
    }

    #[tokio::test]
    async fn delete_cascades_items() {
        let fixture = setup().await;
        let repo = OrderRepository::new(Arc::clone(&fixture.db));

        let (order, items) = repo
            .create_with_items(&fixture.tenant_id, order_params(&fixture, OrderType::Pickup))
            .await
            .unwrap();
        assert!(!items.is_empty());

        repo.delete_by_id(&fixture.tenant_id, &order.id).await.unwrap();

        assert!(
            repo.find_by_id(&fixture.tenant_id, &order.id)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(OrderItem::find().all(&*fixture.db).await.unwrap().len(), 0);
    }
}
