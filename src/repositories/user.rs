//! User repository
//!
//! Staff accounts. Email is unique platform-wide so superadmins can exist
//! without a tenant; tenant-scoped queries still go through tenant_id.

use anyhow::{Result, anyhow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::cursor::{CursorData, encode_cursor};
use crate::models::user::{self, Entity as User, UserRole};

/// Repository for user database operations
#[derive(Debug, Clone)]
pub struct UserRepository {
    pub db: Arc<DatabaseConnection>,
}

impl UserRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds a user by ID within a tenant scope
    pub async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<user::Model>> {
        Ok(User::find_by_id(*id)
            .filter(user::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?)
    }

    /// Finds a user by unique email, regardless of tenant
    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        Ok(User::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?)
    }

    /// Creates a new user record
    pub async fn create(&self, active: user::ActiveModel) -> Result<user::Model> {
        let id = active
            .id
            .clone()
            .take()
            .ok_or_else(|| anyhow!("user id must be set"))?;

        active.insert(&*self.db).await?;

        let fetched = User::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| anyhow!("user not persisted"))
    }

    /// Updates mutable fields on a user within a tenant scope
    pub async fn update_by_id(
        &self,
        tenant_id: &Uuid,
        id: &Uuid,
        update: user::ActiveModel,
    ) -> Result<user::Model> {
        let existing = User::find_by_id(*id)
            .filter(user::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("User with ID '{}' not found for tenant", id))?;

        let mut model: user::ActiveModel = existing.into();

        if let Some(email) = update.email.clone().take() {
            model.email = Set(email);
        }
        if let Some(password_hash) = update.password_hash.clone().take() {
            model.password_hash = Set(password_hash);
        }
        if let Some(first_name) = update.first_name.clone().take() {
            model.first_name = Set(first_name);
        }
        if let Some(last_name) = update.last_name.clone().take() {
            model.last_name = Set(last_name);
        }
        if let Some(role) = update.role.clone().take() {
            model.role = Set(role);
        }
        if let Some(location_id) = update.location_id.clone().take() {
            model.location_id = Set(location_id);
        }
        if let Some(is_active) = update.is_active.clone().take() {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(chrono::Utc::now().into());

        Ok(model.update(&*self.db).await?)
    }

    /// Deletes a user within a tenant scope
    pub async fn delete_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<()> {
        let result = User::delete_by_id(*id)
            .filter(user::Column::TenantId.eq(*tenant_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(anyhow!("User with ID '{}' not found for tenant", id));
        }

        Ok(())
    }

    /// Counts users for a tenant, optionally restricted to one role
    pub async fn count_by_tenant(&self, tenant_id: &Uuid, role: Option<UserRole>) -> Result<u64> {
        let mut query = User::find().filter(user::Column::TenantId.eq(*tenant_id));
        if let Some(role) = role {
            query = query.filter(user::Column::Role.eq(role));
        }
        Ok(query.count(&*self.db).await?)
    }

    /// Lists users for a tenant with cursor pagination and an optional role filter
    pub async fn list_by_tenant(
        &self,
        tenant_id: &Uuid,
        limit: u64,
        cursor: Option<CursorData>,
        role: Option<UserRole>,
    ) -> Result<(Vec<user::Model>, Option<String>)> {
        if limit == 0 {
            return Ok((Vec::new(), None));
        }

        let mut query = User::find()
            .filter(user::Column::TenantId.eq(*tenant_id))
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id);

        if let Some(role) = role {
            query = query.filter(user::Column::Role.eq(role));
        }

        if let Some(cursor) = cursor {
            let condition = Condition::any()
                .add(user::Column::CreatedAt.gt(cursor.created_at))
                .add(
                    Condition::all()
                        .add(user::Column::CreatedAt.eq(cursor.created_at))
                        .add(user::Column::Id.gt(cursor.id)),
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

    fn user_active(tenant_id: Uuid, email: &str, role: UserRole) -> user::ActiveModel {
        let now = chrono::Utc::now();
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(Some(tenant_id)),
            location_id: Set(None),
            email: Set(email.to_string()),
            password_hash: Set("$argon2id$stub".to_string()),
            first_name: Set("Jo".to_string()),
            last_name: Set("Smith".to_string()),
            role: Set(role),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }

    #[tokio::test]
    async fn create_and_find_user() {
        let (db, tenant_id) = setup_with_tenant().await;
        let repo = UserRepository::new(db);

        let created = repo
            .create(user_active(tenant_id, "owner@example.com", UserRole::Owner))
            .await
            .unwrap();

        let found = repo.find_by_id(&tenant_id, &created.id).await.unwrap();
        assert!(found.is_some());

        let by_email = repo
            .find_by_email("owner@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let (db, tenant_id) = setup_with_tenant().await;
        let repo = UserRepository::new(db);

        repo.create(user_active(tenant_id, "same@example.com", UserRole::Owner))
            .await
            .unwrap();
        let result = repo
            .create(user_active(
                tenant_id,
                "same@example.com",
                UserRole::Employee,
            ))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn tenant_scope_hides_foreign_users() {
        let (db, tenant_id) = setup_with_tenant().await;
        let repo = UserRepository::new(db);

        let created = repo
            .create(user_active(tenant_id, "staff@example.com", UserRole::Manager))
            .await
            .unwrap();

        let other_tenant = Uuid::new_v4();
        let found = repo.find_by_id(&other_tenant, &created.id).await.unwrap();
        assert!(found.is_none());

        let result = repo.delete_by_id(&other_tenant, &created.id).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn list_filters_by_role() {
        let (db, tenant_id) = setup_with_tenant().await;
        let repo = UserRepository::new(db);

        repo.create(user_active(tenant_id, "o@example.com", UserRole::Owner))
            .await
            .unwrap();
        repo.create(user_active(tenant_id, "e1@example.com", UserRole::Employee))
            .await
            .unwrap();
        repo.create(user_active(tenant_id, "e2@example.com", UserRole::Employee))
            .await
            .unwrap();

        let (employees, _) = repo
            .list_by_tenant(&tenant_id, 10, None, Some(UserRole::Employee))
            .await
            .unwrap();
        assert_eq!(employees.len(), 2);

        assert_eq!(
            repo.count_by_tenant(&tenant_id, Some(UserRole::Owner))
                .await
                .unwrap(),
            1
        );
        assert_eq!(repo.count_by_tenant(&tenant_id, None).await.unwrap(), 3);
    }
}
