//! Token Ledger
//!
//! Per-user balance plus an append-only transaction log. Every balance
//! change inserts its audit row in the same database transaction, with the
//! balance row locked so writes for one user serialize while different
//! users proceed independently.

use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::prelude::{Json, Uuid};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::entities::prelude::{TokenBalances, TokenTransactions};
use crate::entities::sea_orm_active_enums::{TransactionStatus, TransactionType};
use crate::entities::{token_balances, token_transactions};
use crate::error::{CoreError, CoreResult};
use crate::services::balance_cache::{BalanceCache, CachedBalance};
use crate::services::timestamps;

/// Smallest amount the ledger accepts (1e-8)
pub const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 8);

/// Fractional digits stored for amounts and balances
pub const AMOUNT_SCALE: u32 = 8;

/// Exclusive upper bound for amounts and balances (10^12), the range of a
/// `numeric(20, 8)` column
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

pub const MAX_PAGE_SIZE: u64 = 100;

/// Checks that an amount is positive, within [`MIN_AMOUNT`]..[`MAX_AMOUNT`]
/// and representable with [`AMOUNT_SCALE`] fractional digits.
pub fn validate_amount(amount: Decimal) -> CoreResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::validation(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    if amount < MIN_AMOUNT {
        return Err(CoreError::validation(format!(
            "amount must be at least {}, got {}",
            MIN_AMOUNT, amount
        )));
    }
    if amount >= MAX_AMOUNT {
        return Err(CoreError::validation(format!(
            "amount must be below {}, got {}",
            MAX_AMOUNT, amount
        )));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(CoreError::validation(format!(
            "amount supports at most {} decimal places, got {}",
            AMOUNT_SCALE, amount
        )));
    }
    Ok(amount)
}

/// Sum of signed amounts of `transactions` on top of `initial`.
pub fn replay(initial: Decimal, transactions: &[token_transactions::Model]) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.status == TransactionStatus::Completed)
        .fold(initial, |balance, tx| {
            balance + tx.transaction_type.signed(tx.amount)
        })
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerReconciliation {
    pub user_id: Uuid,
    pub stored_balance: Decimal,
    pub replayed_balance: Decimal,
    pub transactions: usize,
    /// Stored balance matches the replay and every row chains onto the previous one
    pub consistent: bool,
}

#[derive(Clone)]
pub struct TokenLedgerService {
    db: DatabaseConnection,
    cache: BalanceCache,
}

impl TokenLedgerService {
    pub fn new(db: DatabaseConnection, cache: BalanceCache) -> Self {
        Self { db, cache }
    }

    /// Applies one balance change and records it.
    ///
    /// The balance row and the transaction row are written in one database
    /// transaction. Any failure, including the future being dropped before
    /// commit, rolls both back.
    pub async fn apply_transaction(
        &self,
        user_id: Uuid,
        transaction_type: TransactionType,
        amount: Decimal,
        meta_data: Option<Json>,
    ) -> CoreResult<(token_balances::Model, token_transactions::Model)> {
        let amount = validate_amount(amount)?;
        let now = timestamps::now();
        let txn = self.db.begin().await?;

        // Make sure the row exists so there is something to lock
        TokenBalances::insert(token_balances::ActiveModel {
            user_id: Set(user_id),
            balance: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(token_balances::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let balance_row = TokenBalances::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| CoreError::not_found("token balance", user_id))?;

        let balance_before = balance_row.balance;
        let balance_after = balance_before
            .checked_add(transaction_type.signed(amount))
            .filter(|after| *after < MAX_AMOUNT)
            .ok_or_else(|| {
                CoreError::validation(format!(
                    "balance {} plus {} would exceed {}",
                    balance_before, amount, MAX_AMOUNT
                ))
            })?;
        if balance_after < Decimal::ZERO {
            warn!(
                user_id = %user_id,
                balance = %balance_before,
                requested = %amount,
                "Deduction rejected, insufficient balance"
            );
            return Err(CoreError::InsufficientBalance {
                balance: balance_before,
                requested: amount,
            });
        }

        let created_at = timestamps::strictly_after(now, Some(balance_row.updated_at));

        let transaction = token_transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            transaction_type: Set(transaction_type),
            amount: Set(amount),
            balance_before: Set(balance_before),
            balance_after: Set(balance_after),
            status: Set(TransactionStatus::Completed),
            meta_data: Set(meta_data),
            created_at: Set(created_at),
        }
        .insert(&txn)
        .await?;

        let mut active_model: token_balances::ActiveModel = balance_row.into();
        active_model.balance = Set(balance_after);
        active_model.updated_at = Set(created_at);
        let balance = active_model.update(&txn).await?;

        txn.commit().await?;
        self.cache
            .store(user_id, CachedBalance::from_row(&balance))
            .await;

        info!(
            user_id = %user_id,
            transaction_id = %transaction.id,
            transaction_type = %transaction_type,
            amount = %amount,
            balance_before = %balance_before,
            balance_after = %balance_after,
            "Token transaction applied"
        );
        Ok((balance, transaction))
    }

    /// Current balance; zero for users without any transactions.
    pub async fn get_balance(&self, user_id: Uuid) -> CoreResult<Decimal> {
        if let Some(balance) = self.cache.get(&user_id).await {
            debug!(user_id = %user_id, "Balance cache hit");
            return Ok(balance);
        }

        let cached = TokenBalances::find_by_id(user_id)
            .one(&self.db)
            .await?
            .map(|row| CachedBalance::from_row(&row))
            .unwrap_or(CachedBalance::EMPTY);

        debug!(user_id = %user_id, balance = %cached.balance, "Balance cache miss");
        // Loses to any newer value a concurrent write stored meanwhile
        self.cache.store(user_id, cached).await;
        Ok(cached.balance)
    }

    /// Transactions newest first; `page` is 1-based.
    pub async fn get_history(
        &self,
        user_id: Uuid,
        page: u64,
        size: u64,
    ) -> CoreResult<Page<token_transactions::Model>> {
        if page == 0 {
            return Err(CoreError::validation("page must be >= 1"));
        }
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(CoreError::validation(format!(
                "size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, size
            )));
        }

        let paginator = TokenTransactions::find()
            .filter(token_transactions::Column::UserId.eq(user_id))
            .order_by_desc(token_transactions::Column::CreatedAt)
            .order_by_desc(token_transactions::Column::Id)
            .paginate(&self.db, size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok(Page {
            items,
            page,
            size,
            total,
            pages: total.div_ceil(size),
        })
    }

    /// Replays the user's log from zero and compares it with the stored balance.
    pub async fn reconcile(&self, user_id: Uuid) -> CoreResult<LedgerReconciliation> {
        let transactions = TokenTransactions::find()
            .filter(token_transactions::Column::UserId.eq(user_id))
            .order_by_asc(token_transactions::Column::CreatedAt)
            .order_by_asc(token_transactions::Column::Id)
            .all(&self.db)
            .await?;

        let stored_balance = TokenBalances::find_by_id(user_id)
            .one(&self.db)
            .await?
            .map(|row| row.balance)
            .unwrap_or(Decimal::ZERO);

        let replayed_balance = replay(Decimal::ZERO, &transactions);

        let mut running = Decimal::ZERO;
        let mut chained = true;
        for tx in transactions
            .iter()
            .filter(|tx| tx.status == TransactionStatus::Completed)
        {
            if tx.balance_before != running {
                chained = false;
            }
            running = tx.balance_after;
        }

        let consistent = chained && replayed_balance == stored_balance;
        if !consistent {
            warn!(
                user_id = %user_id,
                stored = %stored_balance,
                replayed = %replayed_balance,
                "Token ledger replay mismatch"
            );
        }

        Ok(LedgerReconciliation {
            user_id,
            stored_balance,
            replayed_balance,
            transactions: transactions.len(),
            consistent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tx(kind: TransactionType, amount: Decimal, status: TransactionStatus) -> token_transactions::Model {
        token_transactions::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            transaction_type: kind,
            amount,
            balance_before: Decimal::ZERO,
            balance_after: Decimal::ZERO,
            status,
            meta_data: None,
            created_at: timestamps::now(),
        }
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(dec!(50)).is_ok());
        assert!(validate_amount(dec!(0.00000001)).is_ok());
        assert!(validate_amount(dec!(1.50000000)).is_ok());
        assert!(validate_amount(dec!(0)).is_err());
        assert!(validate_amount(dec!(-5)).is_err());
        assert!(validate_amount(dec!(0.000000009)).is_err());
        assert!(validate_amount(dec!(1.123456789)).is_err());
    }

    #[test]
    fn test_amount_bounds() {
        assert_eq!(MIN_AMOUNT, dec!(0.00000001));
        assert_eq!(MAX_AMOUNT, dec!(1000000000000));
        assert!(validate_amount(dec!(999999999999.99999999)).is_ok());
        assert!(matches!(validate_amount(MAX_AMOUNT), Err(CoreError::Validation(_))));
        assert!(matches!(validate_amount(Decimal::MAX), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_replay_signs() {
        let log = vec![
            tx(TransactionType::Reward, dec!(50), TransactionStatus::Completed),
            tx(TransactionType::Credit, dec!(10), TransactionStatus::Completed),
            tx(TransactionType::Deduction, dec!(25.5), TransactionStatus::Completed),
            tx(TransactionType::Refund, dec!(5), TransactionStatus::Completed),
            tx(TransactionType::Reward, dec!(1000), TransactionStatus::Failed),
        ];
        assert_eq!(replay(Decimal::ZERO, &log), dec!(39.5));
        assert_eq!(replay(dec!(10), &log), dec!(49.5));
    }
}
