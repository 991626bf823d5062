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
                    .table(TokenTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TokenTransactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TokenTransactions::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(TokenTransactions::TransactionType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TokenTransactions::Amount)
                            .decimal_len(precision, crate::MONEY_SCALE)
                            .not_null()
                            .check(Expr::col(TokenTransactions::Amount).gt(0)),
                    )
                    .col(
                        ColumnDef::new(TokenTransactions::BalanceBefore)
                            .decimal_len(precision, crate::MONEY_SCALE)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TokenTransactions::BalanceAfter)
                            .decimal_len(precision, crate::MONEY_SCALE)
                            .not_null()
                            .check(Expr::col(TokenTransactions::BalanceAfter).gte(0)),
                    )
                    .col(
                        ColumnDef::new(TokenTransactions::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TokenTransactions::MetaData).json_binary().null())
                    .col(
                        ColumnDef::new(TokenTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // History paging: (user_id, created_at DESC, id DESC)
        manager
            .create_index(
                Index::create()
                    .name("idx_token_transactions_user_created")
                    .table(TokenTransactions::Table)
                    .col(TokenTransactions::UserId)
                    .col((TokenTransactions::CreatedAt, IndexOrder::Desc))
                    .col((TokenTransactions::Id, IndexOrder::Desc))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TokenTransactions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TokenTransactions {
    Table,
    Id,
    UserId,
    TransactionType,
    Amount,
    BalanceBefore,
    BalanceAfter,
    Status,
    MetaData,
    CreatedAt,
}
