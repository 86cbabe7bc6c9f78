//! Product repository

use anyhow::{Result, anyhow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::cursor::{CursorData, encode_cursor};
use crate::models::product::{self, Entity as Product};

/// Filters accepted by [`ProductRepository::list_by_tenant`]
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub only_available: bool,
}

/// Repository for product database operations
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pub db: Arc<DatabaseConnection>,
}

impl ProductRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds a product by ID within a tenant scope
    pub async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<product::Model>> {
        Ok(Product::find_by_id(*id)
            .filter(product::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?)
    }

    /// Creates a new product record
    pub async fn create(&self, active: product::ActiveModel) -> Result<product::Model> {
        let id = active
            .id
            .clone()
            .take()
            .ok_or_else(|| anyhow!("product id must be set"))?;

        active.insert(&*self.db).await?;

        let fetched = Product::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| anyhow!("product not persisted"))
    }

    /// Updates mutable fields on a product within a tenant scope
    pub async fn update_by_id(
        &self,
        tenant_id: &Uuid,
        id: &Uuid,
        update: product::ActiveModel,
    ) -> Result<product::Model> {
        let existing = Product::find_by_id(*id)
            .filter(product::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("Product with ID '{}' not found for tenant", id))?;

        let mut model: product::ActiveModel = existing.into();

        if let Some(category_id) = update.category_id.clone().take() {
            model.category_id = Set(category_id);
        }
        if let Some(name) = update.name.clone().take() {
            model.name = Set(name);
        }
        if let Some(description) = update.description.clone().take() {
            model.description = Set(description);
        }
        if let Some(price_cents) = update.price_cents.clone().take() {
            model.price_cents = Set(price_cents);
        }
        if let Some(image_url) = update.image_url.clone().take() {
            model.image_url = Set(image_url);
        }
        if let Some(is_available) = update.is_available.clone().take() {
            model.is_available = Set(is_available);
        }
        if let Some(sort_order) = update.sort_order.clone().take() {
            model.sort_order = Set(sort_order);
        }
        model.updated_at = Set(chrono::Utc::now().into());

        Ok(model.update(&*self.db).await?)
    }

    /// Deletes a product within a tenant scope.
    ///
    /// Fails while order items still reference the product; historical orders
    /// keep their snapshots instead of losing rows.
    pub async fn delete_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<()> {
        let result = Product::delete_by_id(*id)
            .filter(product::Column::TenantId.eq(*tenant_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(anyhow!("Product with ID '{}' not found for tenant", id));
        }

        Ok(())
    }

    /// Counts products for a tenant, optionally restricted to one category
    pub async fn count_by_tenant(
        &self,
        tenant_id: &Uuid,
        category_id: Option<Uuid>,
    ) -> Result<u64> {
        let mut query = Product::find().filter(product::Column::TenantId.eq(*tenant_id));
        if let Some(category_id) = category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        Ok(query.count(&*self.db).await?)
    }

    /// Lists products for a tenant with cursor pagination and filters
    pub async fn list_by_tenant(
        &self,
        tenant_id: &Uuid,
        limit: u64,
        cursor: Option<CursorData>,
        filter: ProductFilter,
    ) -> Result<(Vec<product::Model>, Option<String>)> {
        if limit == 0 {
            return Ok((Vec::new(), None));
        }

        let mut query = Product::find()
            .filter(product::Column::TenantId.eq(*tenant_id))
            .order_by_asc(product::Column::CreatedAt)
            .order_by_asc(product::Column::Id);

        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if filter.only_available {
            query = query.filter(product::Column::IsAvailable.eq(true));
        }

        if let Some(cursor) = cursor {
            let condition = Condition::any()
                .add(product::Column::CreatedAt.gt(cursor.created_at))
                .add(
                    Condition::all()
                        .add(product::Column::CreatedAt.eq(cursor.created_at))
                        .add(product::Column::Id.gt(cursor.id)),
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        category,
        tenant::{self, TenantStatus},
    };
    use migration::Migrator;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    async fn setup_with_menu() -> (Arc<DatabaseConnection>, Uuid, Uuid) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

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
        .insert(&db)
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
        .insert(&db)
        .await
        .unwrap();

        (Arc::new(db), tenant_id, category_id)
    }

    fn product_active(
        tenant_id: Uuid,
        category_id: Uuid,
        name: &str,
        price_cents: i64,
        is_available: bool,
    ) -> product::ActiveModel {
        let now = chrono::Utc::now();
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            category_id: Set(category_id),
            name: Set(name.to_string()),
            description: Set(None),
            price_cents: Set(price_cents),
            image_url: Set(None),
            is_available: Set(is_available),
            sort_order: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }

    #[tokio::test]
    async fn create_and_update_product() {
        let (db, tenant_id, category_id) = setup_with_menu().await;
        let repo = ProductRepository::new(db);

        let created = repo
            .create(product_active(
                tenant_id,
                category_id,
                "Margherita",
                1250,
                true,
            ))
            .await
            .unwrap();
        assert_eq!(created.price_cents, 1250);

        let updated = repo
            .update_by_id(
                &tenant_id,
                &created.id,
                product::ActiveModel {
                    price_cents: Set(1350),
                    is_available: Set(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_cents, 1350);
        assert!(!updated.is_available);
    }

    #[tokio::test]
    async fn list_filters_by_availability_and_category() {
        let (db, tenant_id, category_id) = setup_with_menu().await;
        let repo = ProductRepository::new(db);

        repo.create(product_active(
            tenant_id,
            category_id,
            "Margherita",
            1250,
            true,
        ))
        .await
        .unwrap();
        repo.create(product_active(
            tenant_id,
            category_id,
            "Seasonal Special",
            1550,
            false,
        ))
        .await
        .unwrap();

        let (available, _) = repo
            .list_by_tenant(
                &tenant_id,
                10,
                None,
                ProductFilter {
                    only_available: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].name, "Margherita");

        let (in_category, _) = repo
            .list_by_tenant(
                &tenant_id,
                10,
                None,
                ProductFilter {
                    category_id: Some(category_id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(in_category.len(), 2);

        assert_eq!(
            repo.count_by_tenant(&tenant_id, Some(category_id))
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn missing_category_rejected() {
        let (db, tenant_id, _) = setup_with_menu().await;
        let repo = ProductRepository::new(db);

        let result = repo
            .create(product_active(
                tenant_id,
                Uuid::new_v4(),
                "Orphan",
                100,
                true,
            ))
            .await;
        assert!(result.is_err());
    }
}
