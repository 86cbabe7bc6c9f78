//! Migration to create the customers table.
//!
//! End customers are scoped to a tenant and unique by email within it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Customers::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Customers::Email).text().not_null())
                    .col(ColumnDef::new(Customers::FirstName).text().null())
                    .col(ColumnDef::new(Customers::LastName).text().null())
                    .col(ColumnDef::new(Customers::Phone).text().null())
                    .col(
                        ColumnDef::new(Customers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Customers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customers_tenant_id")
                            .from(Customers::Table, Customers::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite unique index on (tenant_id, email)
        manager
            .create_index(
                Index::create()
                    .name("idx_customers_tenant_email")
                    .table(Customers::Table)
                    .col(Customers::TenantId)
                    .col(Customers::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_customers_tenant_id")
                    .table(Customers::Table)
                    .col(Customers::TenantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_customers_tenant_email").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_customers_tenant_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    TenantId,
    Email,
    FirstName,
    LastName,
    Phone,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
