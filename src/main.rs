//! # Orderdesk API Main Entry Point

use migration::Migrator;
use orderdesk::{
    config::ConfigLoader, db::init_pool, seeds::seed_demo_tenant, server::run_server,
    telemetry::init_tracing,
};
use sea_orm_migration::MigratorTrait;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;

    init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = init_pool(&config).await?;
    Migrator::up(&db, None).await?;

    if config.seed_demo_data {
        seed_demo_tenant(&db).await?;
    }

    run_server(config, db).await
}
