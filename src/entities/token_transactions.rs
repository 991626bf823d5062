//! `SeaORM` Entity for token_transactions table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{TransactionStatus, TransactionType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "token_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub transaction_type: TransactionType,
    /// Always positive; the sign comes from `transaction_type`
    #[sea_orm(column_type = "Decimal(Some((20, 8)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 8)))")]
    pub balance_before: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 8)))")]
    pub balance_after: Decimal,
    pub status: TransactionStatus,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub meta_data: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
