//! Tenant entity model
//!
//! This module contains the SeaORM entity model for the tenants table, the
//! root of the multi-tenant hierarchy.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tenant entity representing a customer organization
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    /// Unique identifier for the tenant (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name for the tenant
    pub name: String,

    /// Subdomain under which the tenant's storefront is served (unique)
    pub subdomain: String,

    /// Lifecycle status of the tenant
    pub status: TenantStatus,

    /// Logo URL for the tenant's storefront (optional)
    pub logo_url: Option<String>,

    /// Timestamp when the tenant was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the tenant was last updated
    pub updated_at: DateTimeWithTimeZone,
}

/// Lifecycle status of a tenant account
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TenantStatus {
    #[sea_orm(string_value = "active")]
    #[serde(rename = "active")]
    #[default]
    Active,

    #[sea_orm(string_value = "suspended")]
    #[serde(rename = "suspended")]
    Suspended,

    #[sea_orm(string_value = "inactive")]
    #[serde(rename = "inactive")]
    Inactive,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::location::Entity")]
    Location,

    #[sea_orm(has_many = "super::category::Entity")]
    Category,

    #[sea_orm(has_many = "super::product::Entity")]
    Product,

    #[sea_orm(has_many = "super::customer::Entity")]
    Customer,

    #[sea_orm(has_many = "super::order::Entity")]
    Order,

    #[sea_orm(has_one = "super::tenant_settings::Entity")]
    TenantSettings,
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::tenant_settings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TenantSettings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
