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
                    .table(TokenBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TokenBalances::UserId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TokenBalances::Balance)
                            .decimal_len(precision, crate::MONEY_SCALE)
                            .not_null()
                            .default(0)
                            .check(Expr::col(TokenBalances::Balance).gte(0)),
                    )
                    .col(
                        ColumnDef::new(TokenBalances::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TokenBalances::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TokenBalances::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TokenBalances {
    Table,
    UserId,
    Balance,
    CreatedAt,
    UpdatedAt,
}
