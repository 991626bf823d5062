//! Price Tracker
//!
//! Decides whether a user's watch rule should alert. Checks are triggered
//! from outside (a scheduler calls [`due_trackers`] then [`run_check`]);
//! delivering the alert is the caller's job.

use chrono::Duration;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::prelude::{DateTimeWithTimeZone, Uuid};
use sea_orm::sea_query::{NullOrdering, Order};
use serde::Serialize;
use tracing::{debug, info};

use crate::entities::{prelude::PriceTrackers, price_trackers};
use crate::error::{CoreError, CoreResult};
use crate::services::{deal_price::validate_price, deals::get_deal, timestamps};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    Inactive,
    NotDue,
    ThresholdReached,
    PriceDrop,
    NoTrigger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertDecision {
    pub fire: bool,
    pub reason: AlertReason,
}

impl AlertDecision {
    fn hold(reason: AlertReason) -> Self {
        Self { fire: false, reason }
    }

    fn fire(reason: AlertReason) -> Self {
        Self { fire: true, reason }
    }

    /// Whether this decision consumed a scheduled check
    pub fn was_checked(&self) -> bool {
        !matches!(self.reason, AlertReason::Inactive | AlertReason::NotDue)
    }
}

#[derive(Debug, Clone)]
pub struct NewTracker {
    pub deal_id: Uuid,
    pub user_id: Uuid,
    /// Defaults to the deal's current price
    pub initial_price: Option<Decimal>,
    pub threshold_price: Option<Decimal>,
    pub check_interval: i32,
}

/// True once `check_interval` seconds have passed since `last_check`.
pub fn is_due(tracker: &price_trackers::Model, now: DateTimeWithTimeZone) -> bool {
    match tracker.last_check {
        None => true,
        Some(last) => now - last >= Duration::seconds(i64::from(tracker.check_interval)),
    }
}

/// Percentage fall from `initial` to `latest`; `None` when `initial` is zero
/// or the result does not fit a `Decimal`.
pub fn drop_percent(initial: Decimal, latest: Decimal) -> Option<Decimal> {
    if initial <= Decimal::ZERO {
        return None;
    }
    initial
        .checked_sub(latest)?
        .checked_div(initial)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

pub fn evaluate(
    tracker: &price_trackers::Model,
    latest_price: Decimal,
    now: DateTimeWithTimeZone,
    alert_drop_percent: Decimal,
) -> AlertDecision {
    if !tracker.is_active {
        return AlertDecision::hold(AlertReason::Inactive);
    }
    if !is_due(tracker, now) {
        return AlertDecision::hold(AlertReason::NotDue);
    }

    if let Some(threshold) = tracker.threshold_price {
        if latest_price <= threshold {
            return AlertDecision::fire(AlertReason::ThresholdReached);
        }
    }

    match drop_percent(tracker.initial_price, latest_price) {
        Some(dropped) if dropped > alert_drop_percent => AlertDecision::fire(AlertReason::PriceDrop),
        _ => AlertDecision::hold(AlertReason::NoTrigger),
    }
}

fn validate_new_tracker(new_tracker: &NewTracker) -> CoreResult<()> {
    if new_tracker.check_interval <= 0 {
        return Err(CoreError::validation(format!(
            "check_interval must be > 0 seconds, got {}",
            new_tracker.check_interval
        )));
    }
    if let Some(threshold) = new_tracker.threshold_price {
        validate_price("threshold_price", threshold)?;
    }
    if let Some(initial) = new_tracker.initial_price {
        validate_price("initial_price", initial)?;
    }
    Ok(())
}

pub async fn create_tracker(
    db: &DatabaseConnection,
    new_tracker: NewTracker,
) -> CoreResult<price_trackers::Model> {
    validate_new_tracker(&new_tracker)?;
    let deal = get_deal(db, new_tracker.deal_id).await?;

    let now = timestamps::now();
    let tracker = price_trackers::ActiveModel {
        id: Set(Uuid::new_v4()),
        deal_id: Set(deal.id),
        user_id: Set(new_tracker.user_id),
        initial_price: Set(new_tracker.initial_price.unwrap_or(deal.price)),
        threshold_price: Set(new_tracker.threshold_price),
        check_interval: Set(new_tracker.check_interval),
        last_check: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    info!(
        tracker_id = %tracker.id,
        deal_id = %tracker.deal_id,
        user_id = %tracker.user_id,
        threshold = ?tracker.threshold_price,
        interval_secs = tracker.check_interval,
        "Price tracker created"
    );
    Ok(tracker)
}

pub async fn get_tracker<C>(db: &C, tracker_id: Uuid) -> CoreResult<price_trackers::Model>
where
    C: ConnectionTrait,
{
    PriceTrackers::find_by_id(tracker_id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::not_found("price tracker", tracker_id))
}

async fn lock_tracker<C>(txn: &C, tracker_id: Uuid) -> CoreResult<price_trackers::Model>
where
    C: ConnectionTrait,
{
    PriceTrackers::find_by_id(tracker_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| CoreError::not_found("price tracker", tracker_id))
}

/// Stops tracking. Trackers are kept for history, never deleted here.
pub async fn deactivate_tracker(
    db: &DatabaseConnection,
    tracker_id: Uuid,
) -> CoreResult<price_trackers::Model> {
    let tracker = get_tracker(db, tracker_id).await?;
    if !tracker.is_active {
        return Ok(tracker);
    }

    let mut active_model: price_trackers::ActiveModel = tracker.into();
    active_model.is_active = Set(false);
    active_model.updated_at = Set(timestamps::now());
    let tracker = active_model.update(db).await?;

    info!(tracker_id = %tracker_id, "Price tracker deactivated");
    Ok(tracker)
}

/// Advances `last_check` to `check_at`.
///
/// A repeated call for the same logical check (same `check_at`) or an older
/// one leaves the tracker untouched.
pub async fn mark_checked(
    db: &DatabaseConnection,
    tracker_id: Uuid,
    check_at: DateTimeWithTimeZone,
) -> CoreResult<price_trackers::Model> {
    let check_at = timestamps::normalize(check_at);
    let txn = db.begin().await?;
    let tracker = lock_tracker(&txn, tracker_id).await?;

    if tracker.last_check.is_some_and(|last| last >= check_at) {
        txn.commit().await?;
        debug!(tracker_id = %tracker_id, check_at = %check_at, "Check already recorded");
        return Ok(tracker);
    }

    let tracker = advance_last_check(&txn, tracker, check_at).await?;
    txn.commit().await?;
    Ok(tracker)
}

async fn advance_last_check<C>(
    txn: &C,
    tracker: price_trackers::Model,
    check_at: DateTimeWithTimeZone,
) -> CoreResult<price_trackers::Model>
where
    C: ConnectionTrait,
{
    let mut active_model: price_trackers::ActiveModel = tracker.into();
    active_model.last_check = Set(Some(check_at));
    active_model.updated_at = Set(timestamps::now());
    Ok(active_model.update(txn).await?)
}

/// Evaluates and records one scheduled check atomically.
///
/// The tracker row stays locked between evaluation and the `last_check`
/// update, so concurrent or retried checks with the same `now` fire once.
pub async fn run_check(
    db: &DatabaseConnection,
    tracker_id: Uuid,
    latest_price: Decimal,
    now: DateTimeWithTimeZone,
    alert_drop_percent: Decimal,
) -> CoreResult<(AlertDecision, price_trackers::Model)> {
    let latest_price = validate_price("latest price", latest_price)?;
    let now = timestamps::normalize(now);
    let txn = db.begin().await?;
    let tracker = lock_tracker(&txn, tracker_id).await?;

    let decision = evaluate(&tracker, latest_price, now, alert_drop_percent);
    let tracker = if decision.was_checked() {
        advance_last_check(&txn, tracker, now).await?
    } else {
        tracker
    };
    txn.commit().await?;

    if decision.fire {
        info!(
            tracker_id = %tracker_id,
            user_id = %tracker.user_id,
            latest_price = %latest_price,
            reason = ?decision.reason,
            "Price alert triggered"
        );
    } else {
        debug!(tracker_id = %tracker_id, reason = ?decision.reason, "No price alert");
    }
    Ok((decision, tracker))
}

/// Active trackers whose interval has elapsed at `now`, least recently checked first.
pub async fn due_trackers(
    db: &DatabaseConnection,
    now: DateTimeWithTimeZone,
) -> CoreResult<Vec<price_trackers::Model>> {
    let trackers = PriceTrackers::find()
        .filter(price_trackers::Column::IsActive.eq(true))
        .order_by_with_nulls(
            price_trackers::Column::LastCheck,
            Order::Asc,
            NullOrdering::First,
        )
        .all(db)
        .await?;

    Ok(trackers.into_iter().filter(|t| is_due(t, now)).collect())
}
