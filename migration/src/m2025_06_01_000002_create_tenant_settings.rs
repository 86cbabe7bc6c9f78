//! Migration to create the tenant_settings table.
//!
//! Each tenant has exactly one settings row carrying currency, tax, delivery
//! fee and ordering feature flags. The unique index on tenant_id enforces the
//! 1:1 relation.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TenantSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TenantSettings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TenantSettings::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(TenantSettings::Currency)
                            .text()
                            .not_null()
                            .default("USD"),
                    )
                    .col(
                        ColumnDef::new(TenantSettings::TaxRateBps)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TenantSettings::DeliveryFeeCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TenantSettings::MinOrderCents)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TenantSettings::OnlineOrderingEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TenantSettings::DeliveryEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TenantSettings::PickupEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TenantSettings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TenantSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tenant_settings_tenant_id")
                            .from(TenantSettings::Table, TenantSettings::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tenant_settings_tenant_id")
                    .table(TenantSettings::Table)
                    .col(TenantSettings::TenantId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_tenant_settings_tenant_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(TenantSettings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TenantSettings {
    Table,
    Id,
    TenantId,
    Currency,
    TaxRateBps,
    DeliveryFeeCents,
    MinOrderCents,
    OnlineOrderingEnabled,
    DeliveryEnabled,
    PickupEnabled,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
