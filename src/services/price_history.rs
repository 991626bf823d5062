//! Price History Store
//!
//! Append-only price observations per deal. `created_at` is the natural
//! key within a deal, so inserts generate a timestamp strictly after the
//! newest entry and retry with a fresh one on a unique-key collision.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use sea_orm::prelude::Uuid;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CoreSettings;
use crate::entities::{deals, price_histories, prelude::PriceHistories};
use crate::error::{CoreError, CoreResult};
use crate::services::deal_price::{self, PriceUpdateRules};
use crate::services::deals::{get_deal, lock_deal, normalize_currency, normalize_source};
use crate::services::timestamps;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTrend {
    pub direction: TrendDirection,
    /// Absolute change between the oldest and newest sample, in percent
    pub magnitude: Decimal,
    /// Signed change, newest minus oldest
    pub change: Decimal,
    pub latest_price: Option<Decimal>,
    pub samples: usize,
}

impl PriceTrend {
    fn insufficient(prices: &[Decimal]) -> Self {
        Self {
            direction: TrendDirection::InsufficientData,
            magnitude: Decimal::ZERO,
            change: Decimal::ZERO,
            latest_price: prices.last().copied(),
            samples: prices.len(),
        }
    }
}

/// Computes the trend from prices ordered oldest first.
pub fn trend_from_prices(prices: &[Decimal]) -> PriceTrend {
    let (oldest, newest) = match (prices.first(), prices.last()) {
        (Some(oldest), Some(newest)) if prices.len() >= 2 => (*oldest, *newest),
        _ => return PriceTrend::insufficient(prices),
    };

    let change = newest - oldest;
    let direction = if change > Decimal::ZERO {
        TrendDirection::Rising
    } else if change < Decimal::ZERO {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    };

    let magnitude = if oldest > Decimal::ZERO {
        (change.abs() / oldest * Decimal::ONE_HUNDRED).round_dp(2)
    } else if change.is_zero() {
        Decimal::ZERO
    } else {
        Decimal::ONE_HUNDRED
    };

    PriceTrend {
        direction,
        magnitude,
        change,
        latest_price: Some(newest),
        samples: prices.len(),
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Records a price observation and applies it to the deal's price state.
///
/// # Errors
/// - `Validation` for a price outside the storable range or with more than
///   eight decimal places, a malformed currency or one that differs from the
///   deal's, or an empty or overlong source
/// - `NotFound` when the deal does not exist
/// - `Conflict` when every attempt collided on `(deal_id, created_at)`
pub async fn record_price(
    db: &DatabaseConnection,
    settings: &CoreSettings,
    deal_id: Uuid,
    price: Decimal,
    currency: &str,
    source: &str,
) -> CoreResult<price_histories::Model> {
    let price = deal_price::validate_price("price", price)?;
    let currency = normalize_currency(currency)?;
    let source = normalize_source(source)?;
    let rules = PriceUpdateRules {
        policy: settings.original_price_policy,
        epsilon: settings.price_epsilon,
    };

    for attempt in 1..=settings.max_timestamp_retries {
        match try_record_price(db, rules, deal_id, price, &currency, &source).await {
            Ok((entry, deal)) => {
                info!(
                    deal_id = %deal_id,
                    price = %entry.price,
                    original_price = ?deal.original_price,
                    created_at = %entry.created_at,
                    attempt = attempt,
                    "Price recorded"
                );
                return Ok(entry);
            }
            Err(CoreError::Database(e)) if is_unique_violation(&e) => {
                warn!(
                    deal_id = %deal_id,
                    attempt = attempt,
                    max_attempts = settings.max_timestamp_retries,
                    "Price history timestamp collision, retrying"
                );
            }
            Err(e) => return Err(e),
        }
    }

    Err(CoreError::Conflict(format!(
        "could not allocate a unique price history timestamp for deal {} after {} attempts",
        deal_id, settings.max_timestamp_retries
    )))
}

async fn try_record_price(
    db: &DatabaseConnection,
    rules: PriceUpdateRules,
    deal_id: Uuid,
    price: Decimal,
    currency: &str,
    source: &str,
) -> CoreResult<(price_histories::Model, deals::Model)> {
    let txn = db.begin().await?;

    let deal = lock_deal(&txn, deal_id).await?;
    // One current price per deal, always in the deal currency
    if deal.currency != currency {
        return Err(CoreError::validation(format!(
            "price currency {} does not match deal currency {}",
            currency, deal.currency
        )));
    }

    let newest = PriceHistories::find()
        .filter(price_histories::Column::DealId.eq(deal_id))
        .order_by_desc(price_histories::Column::CreatedAt)
        .one(&txn)
        .await?;
    let created_at = timestamps::strictly_after(timestamps::now(), newest.map(|e| e.created_at));

    let entry = price_histories::ActiveModel {
        id: Set(Uuid::new_v4()),
        deal_id: Set(deal_id),
        price: Set(price),
        currency: Set(currency.to_string()),
        source: Set(source.to_string()),
        created_at: Set(created_at),
    }
    .insert(&txn)
    .await?;

    let updated = deal_price::apply_price_update(deal.clone(), price, rules, created_at)?;
    let mut active_model: deals::ActiveModel = deal.into();
    active_model.price = Set(updated.price);
    active_model.original_price = Set(updated.original_price);
    active_model.updated_at = Set(updated.updated_at);
    let deal = active_model.update(&txn).await?;

    txn.commit().await?;
    Ok((entry, deal))
}

async fn recent_entries<C>(
    db: &C,
    deal_id: Uuid,
    limit: Option<u64>,
) -> CoreResult<Vec<price_histories::Model>>
where
    C: ConnectionTrait,
{
    let mut query = PriceHistories::find()
        .filter(price_histories::Column::DealId.eq(deal_id))
        .order_by_desc(price_histories::Column::CreatedAt)
        .order_by_desc(price_histories::Column::Id);
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    Ok(query.all(db).await?)
}

/// Price history for a deal, newest first. Each call is a fresh snapshot.
pub async fn get_history(
    db: &DatabaseConnection,
    deal_id: Uuid,
    limit: Option<u64>,
) -> CoreResult<Vec<price_histories::Model>> {
    get_deal(db, deal_id).await?;
    let entries = recent_entries(db, deal_id, limit).await?;
    debug!(deal_id = %deal_id, count = entries.len(), "Loaded price history");
    Ok(entries)
}

/// Most recent recorded price, if any
pub async fn latest_price(db: &DatabaseConnection, deal_id: Uuid) -> CoreResult<Option<Decimal>> {
    get_deal(db, deal_id).await?;
    let entries = recent_entries(db, deal_id, Some(1)).await?;
    Ok(entries.first().map(|e| e.price))
}

/// Trend over the `window` most recent observations.
pub async fn compute_trend(
    db: &DatabaseConnection,
    deal_id: Uuid,
    window: u64,
) -> CoreResult<PriceTrend> {
    get_deal(db, deal_id).await?;
    let mut prices: Vec<Decimal> = recent_entries(db, deal_id, Some(window.max(2)))
        .await?
        .into_iter()
        .map(|e| e.price)
        .collect();
    prices.reverse();

    let trend = trend_from_prices(&prices);
    debug!(
        deal_id = %deal_id,
        direction = ?trend.direction,
        magnitude = %trend.magnitude,
        samples = trend.samples,
        "Computed price trend"
    );
    Ok(trend)
}
