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
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Deals::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Deals::Title).string().not_null())
                    .col(ColumnDef::new(Deals::Url).string().not_null())
                    .col(
                        ColumnDef::new(Deals::Price)
                            .decimal_len(precision, crate::MONEY_SCALE)
                            .not_null()
                            .check(Expr::col(Deals::Price).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Deals::OriginalPrice)
                            .decimal_len(precision, crate::MONEY_SCALE)
                            .null(),
                    )
                    .col(ColumnDef::new(Deals::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Deals::Source).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Deals::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Deals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Deals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_deals_status")
                    .table(Deals::Table)
                    .col(Deals::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Deals::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Deals {
    Table,
    Id,
    Title,
    Url,
    Price,
    OriginalPrice,
    Currency,
    Source,
    Status,
    CreatedAt,
    UpdatedAt,
}
