//! # Data Models
//!
//! This module contains all the SeaORM entity models for the Orderdesk
//! platform schema.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod category;
pub mod customer;
pub mod location;
pub mod order;
pub mod order_item;
pub mod product;
pub mod tenant;
pub mod tenant_settings;
pub mod user;

pub use category::Entity as Category;
pub use customer::Entity as Customer;
pub use location::Entity as Location;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use product::Entity as Product;
pub use tenant::Entity as Tenant;
pub use tenant_settings::Entity as TenantSettings;
pub use user::Entity as User;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "orderdesk".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
