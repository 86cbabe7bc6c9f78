//! # Repositories
//!
//! Data access layer built on SeaORM. Each repository owns the queries for
//! one table, keeps tenant scoping explicit, and exposes keyset pagination
//! for list endpoints.

pub mod category;
pub mod customer;
pub mod location;
pub mod order;
pub mod order_item;
pub mod product;
pub mod tenant;
pub mod tenant_settings;
pub mod user;

pub use category::CategoryRepository;
pub use customer::CustomerRepository;
pub use location::LocationRepository;
pub use order::OrderRepository;
pub use order_item::OrderItemRepository;
pub use product::ProductRepository;
pub use tenant::TenantRepository;
pub use tenant_settings::TenantSettingsRepository;
pub use user::UserRepository;
