//! Database migrations for the Orderdesk platform.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_06_01_000001_create_tenants;
mod m2025_06_01_000002_create_tenant_settings;
mod m2025_06_01_000003_create_locations;
mod m2025_06_01_000004_create_users;
mod m2025_06_01_000005_create_categories;
mod m2025_06_01_000006_create_products;
mod m2025_06_01_000007_create_customers;
mod m2025_06_01_000008_create_orders;
mod m2025_06_01_000009_create_order_items;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_01_000001_create_tenants::Migration),
            Box::new(m2025_06_01_000002_create_tenant_settings::Migration),
            Box::new(m2025_06_01_000003_create_locations::Migration),
            Box::new(m2025_06_01_000004_create_users::Migration),
            Box::new(m2025_06_01_000005_create_categories::Migration),
            Box::new(m2025_06_01_000006_create_products::Migration),
            Box::new(m2025_06_01_000007_create_customers::Migration),
            Box::new(m2025_06_01_000008_create_orders::Migration),
            Box::new(m2025_06_01_000009_create_order_items::Migration),
        ]
    }
}
