//! Token ledger request/response models

use rust_decimal::Decimal;
use sea_orm::prelude::{Json, Uuid};
use serde::{Deserialize, Serialize};

use crate::entities::sea_orm_active_enums::TransactionType;
use crate::entities::{token_balances, token_transactions};

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyTransactionRequest {
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    #[serde(default)]
    pub meta_data: Option<Json>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub balance: token_balances::Model,
    pub transaction: token_transactions::Model,
}

fn default_page() -> u64 {
    1
}

fn default_size() -> u64 {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionHistoryQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_size")]
    pub size: u64,
}
