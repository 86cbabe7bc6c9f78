//! Order item repository
//!
//! Line items are written by the order repository inside its transaction;
//! this repository only covers the read paths.

use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::order::{self, Entity as Order};
use crate::models::order_item::{self, Entity as OrderItem};

/// Repository for order item read operations
#[derive(Debug, Clone)]
pub struct OrderItemRepository {
    pub db: Arc<DatabaseConnection>,
}

impl OrderItemRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists the line items of one order, tenant-checked through the order row
    pub async fn list_by_order(
        &self,
        tenant_id: &Uuid,
        order_id: &Uuid,
    ) -> Result<Vec<order_item::Model>> {
        let order_exists = Order::find_by_id(*order_id)
            .filter(order::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?
            .is_some();

        if !order_exists {
            return Ok(Vec::new());
        }

        Ok(OrderItem::find()
            .filter(order_item::Column::OrderId.eq(*order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .order_by_asc(order_item::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Lists every line item sold for one product, most recent first.
    ///
    /// Used to answer "is this product referenced by any order" before a
    /// delete, and for simple sales reporting.
    pub async fn list_by_product(
        &self,
        tenant_id: &Uuid,
        product_id: &Uuid,
        limit: u64,
    ) -> Result<Vec<order_item::Model>> {
        Ok(OrderItem::find()
            .filter(order_item::Column::ProductId.eq(*product_id))
            .inner_join(Order)
            .filter(order::Column::TenantId.eq(*tenant_id))
            .order_by_desc(order_item::Column::CreatedAt)
            .order_by_desc(order_item::Column::Id)
            .limit(limit)
            .all(&*self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::{OrderSource, OrderType, PaymentMethod};
    use crate::models::{
        category, product,
        tenant::{self, TenantStatus},
    };
    use crate::repositories::customer::CustomerContact;
    use crate::repositories::order::{CreateOrder, NewOrderItem};
    use crate::repositories::{CustomerRepository, OrderRepository};
    use migration::Migrator;
    use sea_orm::{ActiveModelTrait, Database, Set};
    use sea_orm_migration::MigratorTrait;

    async fn setup_with_order() -> (Arc<DatabaseConnection>, Uuid, Uuid, Uuid) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let db = Arc::new(db);

        let now = chrono::Utc::now();
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
            name: Set("Sides".to_string()),
            slug: Set("sides".to_string()),
            description: Set(None),
            sort_order: Set(0),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&*db)
        .await
        .unwrap();

        let product_id = Uuid::new_v4();
        product::ActiveModel {
            id: Set(product_id),
            tenant_id: Set(tenant_id),
            category_id: Set(category_id),
            name: Set("Garlic Bread".to_string()),
            description: Set(None),
            price_cents: Set(450),
            image_url: Set(None),
            is_available: Set(true),
            sort_order: Set(0),
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

        let (order, _) = OrderRepository::new(Arc::clone(&db))
            .create_with_items(
                &tenant_id,
                CreateOrder {
                    customer_id: customer.id,
                    location_id: None,
                    order_type: OrderType::Pickup,
                    source: OrderSource::Web,
                    payment_method: PaymentMethod::Cash,
                    notes: None,
                    items: vec![NewOrderItem {
                        product_id,
                        quantity: 3,
                        notes: None,
                    }],
                },
            )
            .await
            .unwrap();

        (db, tenant_id, order.id, product_id)
    }

    #[tokio::test]
    async fn list_by_order_returns_items() {
        let (db, tenant_id, order_id, _) = setup_with_order().await;
        let repo = OrderItemRepository::new(db);

        let items = repo.list_by_order(&tenant_id, &order_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].line_total_cents, 1350);
    }

    #[tokio::test]
    async fn list_by_order_empty_for_foreign_tenant() {
        let (db, _, order_id, _) = setup_with_order().await;
        let repo = OrderItemRepository::new(db);

        let items = repo
            .list_by_order(&Uuid::new_v4(), &order_id)
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn referenced_customer_delete_maps_to_conflict() {
        let (db, tenant_id, _, _) = setup_with_order().await;
        let repo = CustomerRepository::new(Arc::clone(&db));

        let customer = repo
            .find_by_email(&tenant_id, "jo@example.com")
            .await
            .unwrap()
            .unwrap();

        // Orders reference the customer with ON DELETE RESTRICT
        let err = repo
            .delete_by_id(&tenant_id, &customer.id)
            .await
            .unwrap_err();

        let api: crate::error::ApiError = err.into();
        assert_eq!(api.status, axum::http::StatusCode::CONFLICT);
        assert_eq!(api.code, Box::from("CONFLICT"));
    }

    #[tokio::test]
    async fn list_by_product_joins_through_orders() {
        let (db, tenant_id, _, product_id) = setup_with_order().await;
        let repo = OrderItemRepository::new(db);

        let items = repo
            .list_by_product(&tenant_id, &product_id, 10)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);

        let foreign = repo
            .list_by_product(&Uuid::new_v4(), &product_id, 10)
            .await
            .unwrap();
        assert!(foreign.is_empty());
    }
}
