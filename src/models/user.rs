//! User entity model
//!
//! Staff accounts. Users are optionally scoped to a tenant and a location;
//! superadmin users run the platform itself and carry no tenant scope.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant the user belongs to (none for superadmins)
    pub tenant_id: Option<Uuid>,

    /// Location the user works at (optional)
    pub location_id: Option<Uuid>,

    /// Login email (unique across the platform)
    pub email: String,

    /// Password hash; never exposed through the API
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,

    pub role: UserRole,

    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

/// Staff role within a tenant (or the platform, for superadmins)
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
pub enum UserRole {
    #[sea_orm(string_value = "owner")]
    #[serde(rename = "owner")]
    Owner,

    #[sea_orm(string_value = "manager")]
    #[serde(rename = "manager")]
    Manager,

    #[sea_orm(string_value = "employee")]
    #[serde(rename = "employee")]
    #[default]
    Employee,

    #[sea_orm(string_value = "superadmin")]
    #[serde(rename = "superadmin")]
    Superadmin,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,

    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
