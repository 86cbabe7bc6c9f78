//! Tenant settings entity model
//!
//! Per-tenant configuration: currency, tax rate, delivery fee and ordering
//! feature flags. Exactly one row per tenant.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tenant_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning tenant (unique, 1:1 relation)
    pub tenant_id: Uuid,

    /// ISO 4217 currency code, e.g. "USD"
    pub currency: String,

    /// Sales tax rate in basis points (1% = 100)
    pub tax_rate_bps: i32,

    /// Flat delivery fee in minor currency units
    pub delivery_fee_cents: i64,

    /// Minimum order subtotal in minor currency units (optional)
    pub min_order_cents: Option<i64>,

    pub online_ordering_enabled: bool,
    pub delivery_enabled: bool,
    pub pickup_enabled: bool,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
