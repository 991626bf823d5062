//! `SeaORM` Entity prelude

pub use super::deals::Entity as Deals;
pub use super::price_histories::Entity as PriceHistories;
pub use super::price_trackers::Entity as PriceTrackers;
pub use super::token_balances::Entity as TokenBalances;
pub use super::token_transactions::Entity as TokenTransactions;
