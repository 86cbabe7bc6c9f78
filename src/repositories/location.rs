//! Location repository

use anyhow::{Result, anyhow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::cursor::{CursorData, encode_cursor};
use crate::models::location::{self, Entity as Location};

/// Repository for location database operations
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pub db: Arc<DatabaseConnection>,
}

impl LocationRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds a location by ID within a tenant scope
    pub async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<location::Model>> {
        Ok(Location::find_by_id(*id)
            .filter(location::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?)
    }

    /// Creates a new location record
    pub async fn create(&self, active: location::ActiveModel) -> Result<location::Model> {
        let id = active
            .id
            .clone()
            .take()
            .ok_or_else(|| anyhow!("location id must be set"))?;

        active.insert(&*self.db).await?;

        let fetched = Location::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| anyhow!("location not persisted"))
    }

    /// Updates mutable fields on a location within a tenant scope
    pub async fn update_by_id(
        &self,
        tenant_id: &Uuid,
        id: &Uuid,
        update: location::ActiveModel,
    ) -> Result<location::Model> {
        let existing = Location::find_by_id(*id)
            .filter(location::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("Location with ID '{}' not found for tenant", id))?;

        let mut model: location::ActiveModel = existing.into();

        if let Some(name) = update.name.clone().take() {
            model.name = Set(name);
        }
        if let Some(address) = update.address.clone().take() {
            model.address = Set(address);
        }
        if let Some(phone) = update.phone.clone().take() {
            model.phone = Set(phone);
        }
        if let Some(is_active) = update.is_active.clone().take() {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(chrono::Utc::now().into());

        Ok(model.update(&*self.db).await?)
    }

    /// Deletes a location within a tenant scope.
    ///
    /// Users and orders referencing the location keep existing with a null
    /// location_id.
    pub async fn delete_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<()> {
        let result = Location::delete_by_id(*id)
            .filter(location::Column::TenantId.eq(*tenant_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(anyhow!("Location with ID '{}' not found for tenant", id));
        }

        Ok(())
    }

    /// Lists locations for a tenant with cursor pagination
    pub async fn list_by_tenant(
        &self,
        tenant_id: &Uuid,
        limit: u64,
        cursor: Option<CursorData>,
        only_active: bool,
    ) -> Result<(Vec<location::Model>, Option<String>)> {
        if limit == 0 {
            return Ok((Vec::new(), None));
        }

        let mut query = Location::find()
            .filter(location::Column::TenantId.eq(*tenant_id))
            .order_by_asc(location::Column::CreatedAt)
            .order_by_asc(location::Column::Id);

        if only_active {
            query = query.filter(location::Column::IsActive.eq(true));
        }

        if let Some(cursor) = cursor {
            let condition = Condition::any()
                .add(location::Column::CreatedAt.gt(cursor.created_at))
                .add(
                    Condition::all()
                        .add(location::Column::CreatedAt.eq(cursor.created_at))
                        .add(location::Column::Id.gt(cursor.id)),
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
