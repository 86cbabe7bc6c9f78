//! Order entity model
//!
//! Orders belong to a tenant and a customer, optionally to a location, and
//! own their line items. Unique per tenant by order_number. All monetary
//! fields are integer minor currency units.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Uuid,
    pub location_id: Option<Uuid>,
    pub customer_id: Uuid,

    /// Human-facing order reference, unique per tenant
    pub order_number: String,

    pub status: OrderStatus,
    pub order_type: OrderType,
    pub source: OrderSource,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,

    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub delivery_fee_cents: i64,
    pub total_cents: i64,

    pub notes: Option<String>,

    /// When the customer placed the order
    pub placed_at: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

/// Fulfilment status of an order
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
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    #[serde(rename = "pending")]
    #[default]
    Pending,

    #[sea_orm(string_value = "confirmed")]
    #[serde(rename = "confirmed")]
    Confirmed,

    #[sea_orm(string_value = "preparing")]
    #[serde(rename = "preparing")]
    Preparing,

    #[sea_orm(string_value = "ready")]
    #[serde(rename = "ready")]
    Ready,

    #[sea_orm(string_value = "completed")]
    #[serde(rename = "completed")]
    Completed,

    #[sea_orm(string_value = "cancelled")]
    #[serde(rename = "cancelled")]
    Cancelled,
}

/// How the order is fulfilled
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum OrderType {
    #[sea_orm(string_value = "delivery")]
    #[serde(rename = "delivery")]
    Delivery,

    #[sea_orm(string_value = "pickup")]
    #[serde(rename = "pickup")]
    Pickup,

    #[sea_orm(string_value = "dine_in")]
    #[serde(rename = "dine_in")]
    DineIn,
}

/// Channel the order came in through
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum OrderSource {
    #[sea_orm(string_value = "web")]
    #[serde(rename = "web")]
    Web,

    #[sea_orm(string_value = "mobile")]
    #[serde(rename = "mobile")]
    Mobile,

    #[sea_orm(string_value = "phone")]
    #[serde(rename = "phone")]
    Phone,

    #[sea_orm(string_value = "in_store")]
    #[serde(rename = "in_store")]
    InStore,
}

/// How the customer pays
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    #[serde(rename = "cash")]
    Cash,

    #[sea_orm(string_value = "card")]
    #[serde(rename = "card")]
    Card,

    #[sea_orm(string_value = "online")]
    #[serde(rename = "online")]
    Online,
}

/// Settlement state of the payment
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
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    #[serde(rename = "pending")]
    #[default]
    Pending,

    #[sea_orm(string_value = "paid")]
    #[serde(rename = "paid")]
    Paid,

    #[sea_orm(string_value = "refunded")]
    #[serde(rename = "refunded")]
    Refunded,

    #[sea_orm(string_value = "failed")]
    #[serde(rename = "failed")]
    Failed,
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
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,

    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,

    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
