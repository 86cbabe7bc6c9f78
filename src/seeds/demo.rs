//! Demo tenant seeding
//!
//! Creates a "demo" tenant with settings, one location, two categories and
//! a handful of products. Existence of the demo subdomain is the idempotency
//! check, so re-running against an already seeded database is a no-op.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::tenant::TenantStatus;
use crate::models::{category, location, product, tenant};
use crate::repositories::tenant_settings::SettingsUpdate;
use crate::repositories::{
    CategoryRepository, LocationRepository, ProductRepository, TenantRepository,
    TenantSettingsRepository,
};

const DEMO_SUBDOMAIN: &str = "demo";

struct DemoProduct {
    name: &'static str,
    description: &'static str,
    price_cents: i64,
    sort_order: i32,
}

/// Seeds the demo tenant if it does not already exist
pub async fn seed_demo_tenant(db: &DatabaseConnection) -> Result<()> {
    let db = Arc::new(db.clone());
    let tenants = TenantRepository::new(Arc::clone(&db));

    if tenants.find_by_subdomain(DEMO_SUBDOMAIN).await?.is_some() {
        log::info!("Demo tenant already exists, skipping seeding");
        return Ok(());
    }

    log::info!("Seeding demo tenant");
    let now = Utc::now();

    let tenant = tenants
        .create(tenant::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Demo Pizzeria".to_string()),
            subdomain: Set(DEMO_SUBDOMAIN.to_string()),
            status: Set(TenantStatus::Active),
            logo_url: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        })
        .await?;

    TenantSettingsRepository::new(Arc::clone(&db))
        .upsert(
            &tenant.id,
            SettingsUpdate {
                currency: Some("USD".to_string()),
                tax_rate_bps: Some(875),
                delivery_fee_cents: Some(399),
                min_order_cents: Some(Some(1000)),
                online_ordering_enabled: Some(true),
                delivery_enabled: Some(true),
                pickup_enabled: Some(true),
            },
        )
        .await?;

    LocationRepository::new(Arc::clone(&db))
        .create(location::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.id),
            name: Set("Main Street".to_string()),
            address: Set(Some("1 Main Street".to_string())),
            phone: Set(Some("+1-555-0100".to_string())),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        })
        .await?;

    let menu: [(&str, &str, &[DemoProduct]); 2] = [
        (
            "Pizzas",
            "pizzas",
            &[
                DemoProduct {
                    name: "Margherita",
                    description: "Tomato, mozzarella, basil",
                    price_cents: 1250,
                    sort_order: 0,
                },
                DemoProduct {
                    name: "Quattro Formaggi",
                    description: "Four cheese blend",
                    price_cents: 1450,
                    sort_order: 1,
                },
            ],
        ),
        (
            "Drinks",
            "drinks",
            &[
                DemoProduct {
                    name: "Sparkling Water",
                    description: "500ml bottle",
                    price_cents: 300,
                    sort_order: 0,
                },
                DemoProduct {
                    name: "Lemonade",
                    description: "Fresh squeezed",
                    price_cents: 450,
                    sort_order: 1,
                },
            ],
        ),
    ];

    let categories = CategoryRepository::new(Arc::clone(&db));
    let products = ProductRepository::new(Arc::clone(&db));

    for (index, (name, slug, items)) in menu.into_iter().enumerate() {
        let category = categories
            .create(category::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(tenant.id),
                name: Set(name.to_string()),
                slug: Set(slug.to_string()),
                description: Set(None),
                sort_order: Set(index as i32),
                is_active: Set(true),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            })
            .await?;

        for item in items {
            products
                .create(product::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    tenant_id: Set(tenant.id),
                    category_id: Set(category.id),
                    name: Set(item.name.to_string()),
                    description: Set(Some(item.description.to_string())),
                    price_cents: Set(item.price_cents),
                    image_url: Set(None),
                    is_available: Set(true),
                    sort_order: Set(item.sort_order),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                })
                .await?;
        }
    }

    log::info!("Demo tenant seeded with id {}", tenant.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::Migrator;
    use sea_orm::{Database, EntityTrait, PaginatorTrait};
    use sea_orm_migration::MigratorTrait;

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect to in-memory sqlite");
        Migrator::up(&db, None).await.expect("run migrations");
        db
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let db = setup_db().await;

        seed_demo_tenant(&db).await.expect("first seeding run");
        seed_demo_tenant(&db).await.expect("second seeding run");

        let tenant_count = crate::models::Tenant::find()
            .count(&db)
            .await
            .expect("count tenants");
        assert_eq!(tenant_count, 1);

        let product_count = crate::models::Product::find()
            .count(&db)
            .await
            .expect("count products");
        assert_eq!(product_count, 4);
    }

    #[tokio::test]
    async fn test_seeded_tenant_has_settings() {
        let db = setup_db().await;
        seed_demo_tenant(&db).await.expect("seeding run");

        let shared = Arc::new(db.clone());
        let tenant = TenantRepository::new(Arc::clone(&shared))
            .find_by_subdomain(DEMO_SUBDOMAIN)
            .await
            .expect("lookup demo tenant")
            .expect("demo tenant exists");

        let settings = TenantSettingsRepository::new(shared)
            .find_by_tenant(&tenant.id)
            .await
            .expect("lookup settings")
            .expect("settings exist");
        assert_eq!(settings.tax_rate_bps, 875);
        assert_eq!(settings.delivery_fee_cents, 399);
    }
}
