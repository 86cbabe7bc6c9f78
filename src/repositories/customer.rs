//! Customer repository
//!
//! Customers are unique per `(tenant, email)`. Order intake upserts on that
//! key so repeat customers accumulate history under one record.

use anyhow::{Result, anyhow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::cursor::{CursorData, encode_cursor};
use crate::models::customer::{self, Entity as Customer};

/// Contact fields accepted by [`CustomerRepository::upsert_by_email`]
#[derive(Debug, Clone, Default)]
pub struct CustomerContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Repository for customer database operations
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pub db: Arc<DatabaseConnection>,
}

impl CustomerRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds a customer by ID within a tenant scope
    pub async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<customer::Model>> {
        Ok(Customer::find_by_id(*id)
            .filter(customer::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?)
    }

    /// Finds a customer by the unique `(tenant, email)` pair
    pub async fn find_by_email(
        &self,
        tenant_id: &Uuid,
        email: &str,
    ) -> Result<Option<customer::Model>> {
        Ok(Customer::find()
            .filter(customer::Column::TenantId.eq(*tenant_id))
            .filter(customer::Column::Email.eq(email))
            .one(&*self.db)
            .await?)
    }

    /// Creates a new customer record
    pub async fn create(&self, active: customer::ActiveModel) -> Result<customer::Model> {
        let id = active
            .id
            .clone()
            .take()
            .ok_or_else(|| anyhow!("customer id must be set"))?;

        active.insert(&*self.db).await?;

        let fetched = Customer::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| anyhow!("customer not persisted"))
    }

    /// Creates or updates a customer keyed on `(tenant, email)`.
    ///
    /// Contact fields present in `contact` overwrite the stored values;
    /// absent fields are left alone.
    pub async fn upsert_by_email(
        &self,
        tenant_id: &Uuid,
        email: &str,
        contact: CustomerContact,
    ) -> Result<customer::Model> {
        let now = chrono::Utc::now();

        match self.find_by_email(tenant_id, email).await? {
            Some(existing) => {
                let mut model: customer::ActiveModel = existing.into();

                if let Some(first_name) = contact.first_name {
                    model.first_name = Set(Some(first_name));
                }
                if let Some(last_name) = contact.last_name {
                    model.last_name = Set(Some(last_name));
                }
                if let Some(phone) = contact.phone {
                    model.phone = Set(Some(phone));
                }
                model.updated_at = Set(now.into());

                Ok(model.update(&*self.db).await?)
            }
            None => {
                let active = customer::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    tenant_id: Set(*tenant_id),
                    email: Set(email.to_string()),
                    first_name: Set(contact.first_name),
                    last_name: Set(contact.last_name),
                    phone: Set(contact.phone),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                };
                self.create(active).await
            }
        }
    }

    /// Updates mutable fields on a customer within a tenant scope
    pub async fn update_by_id(
        &self,
        tenant_id: &Uuid,
        id: &Uuid,
        update: customer::ActiveModel,
    ) -> Result<customer::Model> {
        let existing = Customer::find_by_id(*id)
            .filter(customer::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("Customer with ID '{}' not found for tenant", id))?;

        let mut model: customer::ActiveModel = existing.into();

        if let Some(email) = update.email.clone().take() {
            model.email = Set(email);
        }
        if let Some(first_name) = update.first_name.clone().take() {
            model.first_name = Set(first_name);
        }
        if let Some(last_name) = update.last_name.clone().take() {
            model.last_name = Set(last_name);
        }
        if let Some(phone) = update.phone.clone().take() {
            model.phone = Set(phone);
        }
        model.updated_at = Set(chrono::Utc::now().into());

        Ok(model.update(&*self.db).await?)
    }

    /// Deletes a customer within a tenant scope.
    ///
    /// Fails while orders still reference the customer.
    pub async fn delete_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<()> {
        let result = Customer::delete_by_id(*id)
            .filter(customer::Column::TenantId.eq(*tenant_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(anyhow!("Customer with ID '{}' not found for tenant", id));
        }

        Ok(())
    }

    /// Counts customers for a tenant
    pub async fn count_by_tenant(&self, tenant_id: &Uuid) -> Result<u64> {
        Ok(Customer::find()
            .filter(customer::Column::TenantId.eq(*tenant_id))
            .count(&*self.db)
            .await?)
    }

    /// Lists customers for a tenant with cursor pagination
    pub async fn list_by_tenant(
        &self,
        tenant_id: &Uuid,
        limit: u64,
        cursor: Option<CursorData>,
    ) -> Result<(Vec<customer::Model>, Option<String>)> {
        if limit == 0 {
            return Ok((Vec::new(), None));
        }

        let mut query = Customer::find()
            .filter(customer::Column::TenantId.eq(*tenant_id))
            .order_by_asc(customer::Column::CreatedAt)
            .order_by_asc(customer::Column::Id);

        if let Some(cursor) = cursor {
            let condition = Condition::any()
                .add(customer::Column::CreatedAt.gt(cursor.created_at))
                .add(
                    Condition::all()
                        .add(customer::Column::CreatedAt.eq(cursor.created_at))
                        .add(customer::Column::Id.gt(cursor.id)),
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
