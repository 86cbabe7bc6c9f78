//! Tenant repository
//!
//! Tenants are the platform-level root records, so queries here are not
//! scoped to another tenant the way every other repository is.

use anyhow::{Result, anyhow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::cursor::{CursorData, encode_cursor};
use crate::models::tenant::{self, Entity as Tenant, TenantStatus};

/// Repository for tenant database operations
#[derive(Debug, Clone)]
pub struct TenantRepository {
    pub db: Arc<DatabaseConnection>,
}

impl TenantRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds a tenant by its ID
    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<tenant::Model>> {
        Ok(Tenant::find_by_id(*id).one(&*self.db).await?)
    }

    /// Finds a tenant by its unique subdomain
    pub async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<tenant::Model>> {
        Ok(Tenant::find()
            .filter(tenant::Column::Subdomain.eq(subdomain))
            .one(&*self.db)
            .await?)
    }

    /// Creates a new tenant record
    pub async fn create(&self, active: tenant::ActiveModel) -> Result<tenant::Model> {
        let id = active
            .id
            .clone()
            .take()
            .ok_or_else(|| anyhow!("tenant id must be set"))?;

        active.insert(&*self.db).await?;

        // Query the record directly since we already know the ID; this works
        // on both Postgres and SQLite.
        let fetched = Tenant::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| anyhow!("tenant not persisted"))
    }

    /// Updates mutable fields on a tenant
    pub async fn update_by_id(
        &self,
        id: &Uuid,
        update: tenant::ActiveModel,
    ) -> Result<tenant::Model> {
        let existing = Tenant::find_by_id(*id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("Tenant with ID '{}' not found", id))?;

        let mut model: tenant::ActiveModel = existing.into();

        if let Some(name) = update.name.clone().take() {
            model.name = Set(name);
        }
        if let Some(subdomain) = update.subdomain.clone().take() {
            model.subdomain = Set(subdomain);
        }
        if let Some(status) = update.status.clone().take() {
            model.status = Set(status);
        }
        if let Some(logo_url) = update.logo_url.clone().take() {
            model.logo_url = Set(logo_url);
        }
        model.updated_at = Set(chrono::Utc::now().into());

        Ok(model.update(&*self.db).await?)
    }

    /// Deletes a tenant; cascades clean out the owned rows
    pub async fn delete_by_id(&self, id: &Uuid) -> Result<()> {
        let result = Tenant::delete_by_id(*id).exec(&*self.db).await?;

        if result.rows_affected == 0 {
            return Err(anyhow!("Tenant with ID '{}' not found", id));
        }

        Ok(())
    }

    /// Counts tenants, optionally restricted to one status
    pub async fn count(&self, status: Option<TenantStatus>) -> Result<u64> {
        let mut query = Tenant::find();
        if let Some(status) = status {
            query = query.filter(tenant::Column::Status.eq(status));
        }
        Ok(query.count(&*self.db).await?)
    }

    /// Lists tenants ordered by creation time then ID with cursor pagination
    pub async fn list(
        &self,
        limit: u64,
        cursor: Option<CursorData>,
        status: Option<TenantStatus>,
    ) -> Result<(Vec<tenant::Model>, Option<String>)> {
        if limit == 0 {
            return Ok((Vec::new(), None));
        }

        let mut query = Tenant::find()
            .order_by_asc(tenant::Column::CreatedAt)
            .order_by_asc(tenant::Column::Id);

        if let Some(status) = status {
            query = query.filter(tenant::Column::Status.eq(status));
        }

        if let Some(cursor) = cursor {
            let condition = Condition::any()
                .add(tenant::Column::CreatedAt.gt(cursor.created_at))
                .add(
                    Condition::all()
                        .add(tenant::Column::CreatedAt.eq(cursor.created_at))
                        .add(tenant::Column::Id.gt(cursor.id)),
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
    use migration::Migrator;
    use sea_orm::{Database, Set};
    use sea_orm_migration::MigratorTrait;

    async fn setup() -> Arc<DatabaseConnection> {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        Arc::new(db)
    }

    fn tenant_active(name: &str, subdomain: &str) -> tenant::ActiveModel {
        let now = chrono::Utc::now();
        tenant::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            subdomain: Set(subdomain.to_string()),
            status: Set(TenantStatus::Active),
            logo_url: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }

    #[tokio::test]
    async fn create_and_find_tenant() {
        let repo = TenantRepository::new(setup().await);

        let created = repo
            .create(tenant_active("Pizza Palace", "pizza-palace"))
            .await
            .unwrap();

        let found = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Pizza Palace");
        assert_eq!(found.status, TenantStatus::Active);

        let by_subdomain = repo
            .find_by_subdomain("pizza-palace")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_subdomain.id, created.id);
    }

    #[tokio::test]
    async fn duplicate_subdomain_rejected() {
        let repo = TenantRepository::new(setup().await);

        repo.create(tenant_active("First", "shared")).await.unwrap();
        let result = repo.create(tenant_active("Second", "shared")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn update_tenant_status() {
        let repo = TenantRepository::new(setup().await);
        let created = repo
            .create(tenant_active("Burger Barn", "burger-barn"))
            .await
            .unwrap();

        let update = tenant::ActiveModel {
            status: Set(TenantStatus::Suspended),
            ..Default::default()
        };
        let updated = repo.update_by_id(&created.id, update).await.unwrap();
        assert_eq!(updated.status, TenantStatus::Suspended);
        // Untouched fields survive partial updates
        assert_eq!(updated.name, "Burger Barn");
    }

    #[tokio::test]
    async fn delete_missing_tenant_errors() {
        let repo = TenantRepository::new(setup().await);
        let result = repo.delete_by_id(&Uuid::new_v4()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn list_paginates_with_cursor() {
        let repo = TenantRepository::new(setup().await);

        for i in 0..5 {
            repo.create(tenant_active(&format!("Tenant {}", i), &format!("t-{}", i)))
                .await
                .unwrap();
        }

        let (page_one, next) = repo.list(2, None, None).await.unwrap();
        assert_eq!(page_one.len(), 2);
        let next = next.expect("more pages exist");

        let cursor = crate::cursor::decode_cursor(&next).unwrap();
        let (page_two, _) = repo.list(2, Some(cursor), None).await.unwrap();
        assert_eq!(page_two.len(), 2);

        let page_one_ids: Vec<_> = page_one.iter().map(|t| t.id).collect();
        assert!(page_two.iter().all(|t| !page_one_ids.contains(&t.id)));
    }

    #[tokio::test]
    async fn count_by_status() {
        let repo = TenantRepository::new(setup().await);

        repo.create(tenant_active("A", "a")).await.unwrap();
        let b = repo.create(tenant_active("B", "b")).await.unwrap();
        repo.update_by_id(
            &b.id,
            tenant::ActiveModel {
                status: Set(TenantStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(repo.count(None).await.unwrap(), 2);
        assert_eq!(repo.count(Some(TenantStatus::Active)).await.unwrap(), 1);
        assert_eq!(repo.count(Some(TenantStatus::Inactive)).await.unwrap(), 1);
    }
}
