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
                    .table(PriceHistories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PriceHistories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PriceHistories::DealId).uuid().not_null())
                    .col(
                        ColumnDef::new(PriceHistories::Price)
                            .decimal_len(precision, crate::MONEY_SCALE)
                            .not_null()
                            .check(Expr::col(PriceHistories::Price).gte(0)),
                    )
                    .col(
                        ColumnDef::new(PriceHistories::Currency)
                            .string_len(3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PriceHistories::Source)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PriceHistories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_price_histories_deal_id")
                            .from(PriceHistories::Table, PriceHistories::DealId)
                            .to(Deals::Table, Deals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // created_at is the natural key within a deal: (deal_id, created_at DESC)
        manager
            .create_index(
                Index::create()
                    .name("uq_price_histories_deal_created")
                    .table(PriceHistories::Table)
                    .col(PriceHistories::DealId)
                    .col((PriceHistories::CreatedAt, IndexOrder::Desc))
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PriceHistories::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PriceHistories {
    Table,
    Id,
    DealId,
    Price,
    Currency,
    Source,
    CreatedAt,
}

#[derive(Iden)]
enum Deals {
    Table,
    Id,
}
