//! Balance cache keyed by user id.
//!
//! Owned by [`TokenLedgerService`](super::token_ledger::TokenLedgerService).
//! Committed writes store their new balance directly; reads fill misses.
//! Each entry carries the `updated_at` of the row it came from and a store
//! never replaces a newer entry, so a read that raced a write cannot put the
//! pre-commit balance back.

use moka::future::Cache;
use moka::ops::compute::Op;
use rust_decimal::Decimal;
use sea_orm::prelude::{DateTimeWithTimeZone, Uuid};
use std::sync::Arc;
use std::time::Duration;

use crate::entities::token_balances;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedBalance {
    pub balance: Decimal,
    /// `updated_at` of the source row, `None` while the user has no row
    pub as_of: Option<DateTimeWithTimeZone>,
}

impl CachedBalance {
    pub const EMPTY: CachedBalance = CachedBalance {
        balance: Decimal::ZERO,
        as_of: None,
    };

    pub fn from_row(row: &token_balances::Model) -> Self {
        Self {
            balance: row.balance,
            as_of: Some(row.updated_at),
        }
    }
}

#[derive(Clone)]
pub struct BalanceCache {
    cache: Arc<Cache<Uuid, CachedBalance>>,
}

impl BalanceCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            cache: Arc::new(cache),
        }
    }

    pub async fn get(&self, user_id: &Uuid) -> Option<Decimal> {
        self.cache.get(user_id).await.map(|cached| cached.balance)
    }

    /// Caches `fresh` unless the entry already holds a value at least as new.
    pub async fn store(&self, user_id: Uuid, fresh: CachedBalance) {
        self.cache
            .entry(user_id)
            .and_compute_with(|current| {
                let op = match current {
                    Some(entry) if entry.value().as_of >= fresh.as_of => Op::Nop,
                    _ => Op::Put(fresh),
                };
                std::future::ready(op)
            })
            .await;
    }
}
