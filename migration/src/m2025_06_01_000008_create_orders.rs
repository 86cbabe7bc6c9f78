//! Migration to create the orders table.
//!
//! Orders are unique per tenant by order_number. Monetary fields are integer
//! minor units. Customers with orders cannot be deleted; deleting a location
//! detaches its orders.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Orders::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Orders::LocationId).uuid().null())
                    .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Orders::OrderNumber).text().not_null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Orders::OrderType).text().not_null())
                    .col(ColumnDef::new(Orders::Source).text().not_null())
                    .col(ColumnDef::new(Orders::PaymentMethod).text().not_null())
                    .col(
                        ColumnDef::new(Orders::PaymentStatus)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Orders::SubtotalCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Orders::TaxCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Orders::DeliveryFeeCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Orders::TotalCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Orders::Notes).text().null())
                    .col(
                        ColumnDef::new(Orders::PlacedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_tenant_id")
                            .from(Orders::Table, Orders::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_customer_id")
                            .from(Orders::Table, Orders::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_location_id")
                            .from(Orders::Table, Orders::LocationId)
                            .to(Locations::Table, Locations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite unique index on (tenant_id, order_number)
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_tenant_order_number")
                    .table(Orders::Table)
                    .col(Orders::TenantId)
                    .col(Orders::OrderNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_tenant_id")
                    .table(Orders::Table)
                    .col(Orders::TenantId)
                    .to_owned(),
            )
            .await?;

        // Status filtering is the hot list path
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_tenant_status")
                    .table(Orders::Table)
                    .col(Orders::TenantId)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_tenant_order_number")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_orders_tenant_id").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_orders_tenant_status").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    TenantId,
    LocationId,
    CustomerId,
    OrderNumber,
    Status,
    OrderType,
    Source,
    PaymentMethod,
    PaymentStatus,
    SubtotalCents,
    TaxCents,
    DeliveryFeeCents,
    TotalCents,
    Notes,
    PlacedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
}
