use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let precision = crate::money_precision(manager);

        manager
            .create_table(
                Table::create()
                    .table(PriceTrackers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PriceTrackers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PriceTrackers::DealId).uuid().not_null())
                    .col(ColumnDef::new(PriceTrackers::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(PriceTrackers::InitialPrice)
                            .decimal_len(precision, crate::MONEY_SCALE)
                            .not_null()
                            .check(Expr::col(PriceTrackers::InitialPrice).gte(0)),
                    )
                    .col(
                        ColumnDef::new(PriceTrackers::ThresholdPrice)
                            .decimal_len(precision, crate::MONEY_SCALE)
                            .null()
                            .check(Expr::col(PriceTrackers::ThresholdPrice).gte(0)),
                    )
                    .col(
                        ColumnDef::new(PriceTrackers::CheckInterval)
                            .integer()
                            .not_null()
                            .check(Expr::col(PriceTrackers::CheckInterval).gt(0)),
                    )
                    .col(
                        ColumnDef::new(PriceTrackers::LastCheck)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PriceTrackers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PriceTrackers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PriceTrackers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_price_trackers_deal_id")
                            .from(PriceTrackers::Table, PriceTrackers::DealId)
                            .to(Deals::Table, Deals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Scheduler scans: active trackers ordered by last check
        manager
            .create_index(
                Index::create()
                    .name("idx_price_trackers_active_last_check")
                    .table(PriceTrackers::Table)
                    .col(PriceTrackers::IsActive)
                    .col(PriceTrackers::LastCheck)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_price_trackers_user")
                    .table(PriceTrackers::Table)
                    .col(PriceTrackers::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PriceTrackers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PriceTrackers {
    Table,
    Id,
    DealId,
    UserId,
    InitialPrice,
    ThresholdPrice,
    CheckInterval,
    LastCheck,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Deals {
    Table,
    Id,
}
