//! Category repository
//!
//! Menu categories are ordered by an explicit sort_order for display, so the
//! list path sorts on (sort_order, created_at, id) rather than pure keyset
//! order. Pagination still keys on (created_at, id).

use anyhow::{Result, anyhow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::cursor::{CursorData, encode_cursor};
use crate::models::category::{self, Entity as Category};

/// Repository for category database operations
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pub db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds a category by ID within a tenant scope
    pub async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<category::Model>> {
        Ok(Category::find_by_id(*id)
            .filter(category::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?)
    }

    /// Finds a category by its unique `(tenant, slug)` pair
    pub async fn find_by_slug(
        &self,
        tenant_id: &Uuid,
        slug: &str,
    ) -> Result<Option<category::Model>> {
        Ok(Category::find()
            .filter(category::Column::TenantId.eq(*tenant_id))
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?)
    }

    /// Creates a new category record
    pub async fn create(&self, active: category::ActiveModel) -> Result<category::Model> {
        let id = active
            .id
            .clone()
            .take()
            .ok_or_else(|| anyhow!("category id must be set"))?;

        active.insert(&*self.db).await?;

        let fetched = Category::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| anyhow!("category not persisted"))
    }

    /// Updates mutable fields on a category within a tenant scope
    pub async fn update_by_id(
        &self,
        tenant_id: &Uuid,
        id: &Uuid,
        update: category::ActiveModel,
    ) -> Result<category::Model> {
        let existing = Category::find_by_id(*id)
            .filter(category::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("Category with ID '{}' not found for tenant", id))?;

        let mut model: category::ActiveModel = existing.into();

        if let Some(name) = update.name.clone().take() {
            model.name = Set(name);
        }
        if let Some(slug) = update.slug.clone().take() {
            model.slug = Set(slug);
        }
        if let Some(description) = update.description.clone().take() {
            model.description = Set(description);
        }
        if let Some(sort_order) = update.sort_order.clone().take() {
            model.sort_order = Set(sort_order);
        }
        if let Some(is_active) = update.is_active.clone().take() {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(chrono::Utc::now().into());

        Ok(model.update(&*self.db).await?)
    }

    /// Deletes a category within a tenant scope.
    ///
    /// Fails while products still reference the category; callers must move
    /// or delete those first.
    pub async fn delete_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<()> {
        let result = Category::delete_by_id(*id)
            .filter(category::Column::TenantId.eq(*tenant_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(anyhow!("Category with ID '{}' not found for tenant", id));
        }

        Ok(())
    }

    /// Lists all categories for a tenant in display order
    pub async fn find_by_tenant(&self, tenant_id: &Uuid) -> Result<Vec<category::Model>> {
        Ok(Category::find()
            .filter(category::Column::TenantId.eq(*tenant_id))
            .order_by_asc(category::Column::SortOrder)
            .order_by_asc(category::Column::CreatedAt)
            .order_by_asc(category::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Lists categories for a tenant with cursor pagination
    pub async fn list_by_tenant(
        &self,
        tenant_id: &Uuid,
        limit: u64,
        cursor: Option<CursorData>,
        only_active: bool,
    ) -> Result<(Vec<category::Model>, Option<String>)> {
        if limit == 0 {
            return Ok((Vec::new(), None));
        }

        let mut query = Category::find()
            .filter(category::Column::TenantId.eq(*tenant_id))
            .order_by_asc(category::Column::CreatedAt)
            .order_by_asc(category::Column::Id);

        if only_active {
            query = query.filter(category::Column::IsActive.eq(true));
        }

        if let Some(cursor) = cursor {
            let condition = Condition::any()
                .add(category::Column::CreatedAt.gt(cursor.created_at))
                .add(
                    Condition::all()
                        .add(category::Column::CreatedAt.eq(cursor.created_at))
                        .add(category::Column::Id.gt(cursor.id)),
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
    use crate::models::tenant::{self, TenantStatus};
    use migration::Migrator;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    async fn setup_with_tenant() -> (Arc<DatabaseConnection>, Uuid) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let tenant_id = Uuid::new_v4();
        let now = chrono::Utc::now();
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

        (Arc::new(db), tenant_id)
    }

    fn category_active(tenant_id: Uuid, slug: &str, sort_order: i32) -> category::ActiveModel {
        let now = chrono::Utc::now();
        category::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(slug.to_string()),
            slug: Set(slug.to_string()),
            description: Set(None),
            sort_order: Set(sort_order),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }

    #[tokio::test]
    async fn slug_unique_per_tenant() {
        let (db, tenant_id) = setup_with_tenant().await;
        let repo = CategoryRepository::new(Arc::clone(&db));

        repo.create(category_active(tenant_id, "pizzas", 0))
            .await
            .unwrap();
        let duplicate = repo.create(category_active(tenant_id, "pizzas", 1)).await;
        assert!(duplicate.is_err());

        // The same slug under another tenant is fine
        let now = chrono::Utc::now();
        let other_tenant = Uuid::new_v4();
        tenant::ActiveModel {
            id: Set(other_tenant),
            name: Set("Other".to_string()),
            subdomain: Set("other".to_string()),
            status: Set(TenantStatus::Active),
            logo_url: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&*db)
        .await
        .unwrap();

        assert!(
            repo.create(category_active(other_tenant, "pizzas", 0))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn find_by_tenant_sorts_by_sort_order() {
        let (db, tenant_id) = setup_with_tenant().await;
        let repo = CategoryRepository::new(db);

        repo.create(category_active(tenant_id, "desserts", 2))
            .await
            .unwrap();
        repo.create(category_active(tenant_id, "starters", 0))
            .await
            .unwrap();
        repo.create(category_active(tenant_id, "mains", 1))
            .await
            .unwrap();

        let ordered = repo.find_by_tenant(&tenant_id).await.unwrap();
        let slugs: Vec<_> = ordered.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["starters", "mains", "desserts"]);
    }

    #[tokio::test]
    async fn find_by_slug_scoped_to_tenant() {
        let (db, tenant_id) = setup_with_tenant().await;
        let repo = CategoryRepository::new(db);

        repo.create(category_active(tenant_id, "drinks", 0))
            .await
            .unwrap();

        assert!(
            repo.find_by_slug(&tenant_id, "drinks")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            repo.find_by_slug(&Uuid::new_v4(), "drinks")
                .await
                .unwrap()
                .is_none()
        );
    }
}
