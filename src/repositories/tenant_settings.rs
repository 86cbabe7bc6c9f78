//! Tenant settings repository
//!
//! Settings are a one-row-per-tenant table, so the write path is an upsert
//! keyed on tenant_id rather than separate create/update operations.

use anyhow::{Result, anyhow};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::tenant_settings::{self, Entity as TenantSettings};

/// Repository for tenant settings database operations
#[derive(Debug, Clone)]
pub struct TenantSettingsRepository {
    pub db: Arc<DatabaseConnection>,
}

/// Fields accepted by [`TenantSettingsRepository::upsert`]
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub currency: Option<String>,
    pub tax_rate_bps: Option<i32>,
    pub delivery_fee_cents: Option<i64>,
    pub min_order_cents: Option<Option<i64>>,
    pub online_ordering_enabled: Option<bool>,
    pub delivery_enabled: Option<bool>,
    pub pickup_enabled: Option<bool>,
}

impl TenantSettingsRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds the settings row for a tenant
    pub async fn find_by_tenant(&self, tenant_id: &Uuid) -> Result<Option<tenant_settings::Model>> {
        Ok(TenantSettings::find()
            .filter(tenant_settings::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?)
    }

    /// Creates or updates the settings row for a tenant.
    ///
    /// On insert, fields not present in `update` fall back to the schema
    /// defaults. On update, only the present fields change.
    pub async fn upsert(
        &self,
        tenant_id: &Uuid,
        update: SettingsUpdate,
    ) -> Result<tenant_settings::Model> {
        let now = chrono::Utc::now();

        match self.find_by_tenant(tenant_id).await? {
            Some(existing) => {
                let mut model: tenant_settings::ActiveModel = existing.into();

                if let Some(currency) = update.currency {
                    model.currency = Set(currency);
                }
                if let Some(tax_rate_bps) = update.tax_rate_bps {
                    model.tax_rate_bps = Set(tax_rate_bps);
                }
                if let Some(delivery_fee_cents) = update.delivery_fee_cents {
                    model.delivery_fee_cents = Set(delivery_fee_cents);
                }
                if let Some(min_order_cents) = update.min_order_cents {
                    model.min_order_cents = Set(min_order_cents);
                }
                if let Some(enabled) = update.online_ordering_enabled {
                    model.online_ordering_enabled = Set(enabled);
                }
                if let Some(enabled) = update.delivery_enabled {
                    model.delivery_enabled = Set(enabled);
                }
                if let Some(enabled) = update.pickup_enabled {
                    model.pickup_enabled = Set(enabled);
                }
                model.updated_at = Set(now.into());

                Ok(model.update(&*self.db).await?)
            }
            None => {
                let id = Uuid::new_v4();
                let active = tenant_settings::ActiveModel {
                    id: Set(id),
                    tenant_id: Set(*tenant_id),
                    currency: Set(update.currency.unwrap_or_else(|| "USD".to_string())),
                    tax_rate_bps: Set(update.tax_rate_bps.unwrap_or(0)),
                    delivery_fee_cents: Set(update.delivery_fee_cents.unwrap_or(0)),
                    min_order_cents: Set(update.min_order_cents.unwrap_or(None)),
                    online_ordering_enabled: Set(update.online_ordering_enabled.unwrap_or(true)),
                    delivery_enabled: Set(update.delivery_enabled.unwrap_or(true)),
                    pickup_enabled: Set(update.pickup_enabled.unwrap_or(true)),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                };

                active.insert(&*self.db).await?;

                let fetched = TenantSettings::find_by_id(id).one(&*self.db).await?;
                fetched.ok_or_else(|| anyhow!("tenant settings not persisted"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tenant::{self, TenantStatus};
    use migration::Migrator;
    use sea_orm::{ActiveModelTrait, Database};
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

    #[tokio::test]
    async fn upsert_inserts_with_defaults() {
        let (db, tenant_id) = setup_with_tenant().await;
        let repo = TenantSettingsRepository::new(db);

        assert!(repo.find_by_tenant(&tenant_id).await.unwrap().is_none());

        let settings = repo
            .upsert(&tenant_id, SettingsUpdate::default())
            .await
            .unwrap();

        assert_eq!(settings.currency, "USD");
        assert_eq!(settings.tax_rate_bps, 0);
        assert!(settings.online_ordering_enabled);
        assert_eq!(settings.min_order_cents, None);
    }

    #[tokio::test]
    async fn upsert_updates_existing_row() {
        let (db, tenant_id) = setup_with_tenant().await;
        let repo = TenantSettingsRepository::new(db);

        let first = repo
            .upsert(
                &tenant_id,
                SettingsUpdate {
                    currency: Some("EUR".to_string()),
                    tax_rate_bps: Some(1950),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let second = repo
            .upsert(
                &tenant_id,
                SettingsUpdate {
                    delivery_fee_cents: Some(499),
                    min_order_cents: Some(Some(1500)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Same row, merged fields
        assert_eq!(second.id, first.id);
        assert_eq!(second.currency, "EUR");
        assert_eq!(second.tax_rate_bps, 1950);
        assert_eq!(second.delivery_fee_cents, 499);
        assert_eq!(second.min_order_cents, Some(1500));
    }
}
