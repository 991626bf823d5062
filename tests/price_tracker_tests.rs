mod common;

use chrono::Duration;
use deals_ledger::config::CoreSettings;
use deals_ledger::entities::price_trackers;
use deals_ledger::error::CoreError;
use deals_ledger::services::price_tracker::{self, AlertReason, NewTracker};
use deals_ledger::services::{deals, timestamps};
use rust_decimal_macros::dec;
use sea_orm::prelude::Uuid;

use crate::common::{seed_deal, setup_test_db};

fn new_tracker(deal_id: Uuid) -> NewTracker {
    NewTracker {
        deal_id,
        user_id: Uuid::new_v4(),
        initial_price: None,
        threshold_price: Some(dec!(80.00)),
        check_interval: 3600,
    }
}

#[tokio::test]
async fn test_threshold_alert_fires_once() {
    let db = setup_test_db().await.unwrap();
    let drop_percent = CoreSettings::default().price_drop_alert_percent;
    let deal = seed_deal(&db, dec!(100.00)).await;

    let tracker = price_tracker::create_tracker(&db, new_tracker(deal.id))
        .await
        .unwrap();
    assert_eq!(tracker.initial_price, dec!(100.00));
    assert!(tracker.last_check.is_none());

    let now = timestamps::now();
    let (decision, checked) = price_tracker::run_check(&db, tracker.id, dec!(75.00), now, drop_percent)
        .await
        .unwrap();
    assert!(decision.fire);
    assert_eq!(decision.reason, AlertReason::ThresholdReached);
    assert_eq!(checked.last_check, Some(now));

    // Retrying the same logical check does not fire again
    let (retry, _) = price_tracker::run_check(&db, tracker.id, dec!(75.00), now, drop_percent)
        .await
        .unwrap();
    assert!(!retry.fire);
    assert_eq!(retry.reason, AlertReason::NotDue);

    // Next interval fires again
    let later = now + Duration::seconds(3600);
    let (next, checked) = price_tracker::run_check(&db, tracker.id, dec!(75.00), later, drop_percent)
        .await
        .unwrap();
    assert!(next.fire);
    assert_eq!(checked.last_check, Some(later));
}

#[tokio::test]
async fn test_percentage_drop_without_threshold() {
    let db = setup_test_db().await.unwrap();
    let deal = seed_deal(&db, dec!(200)).await;

    let tracker = price_tracker::create_tracker(
        &db,
        NewTracker {
            threshold_price: None,
            ..new_tracker(deal.id)
        },
    )
    .await
    .unwrap();

    let now = timestamps::now();
    let (decision, _) = price_tracker::run_check(&db, tracker.id, dec!(185), now, dec!(10))
        .await
        .unwrap();
    assert!(!decision.fire);
    assert_eq!(decision.reason, AlertReason::NoTrigger);

    let (decision, _) = price_tracker::run_check(
        &db,
        tracker.id,
        dec!(170),
        now + Duration::seconds(3600),
        dec!(10),
    )
    .await
    .unwrap();
    assert!(decision.fire);
    assert_eq!(decision.reason, AlertReason::PriceDrop);
}

#[tokio::test]
async fn test_mark_checked_is_idempotent() {
    let db = setup_test_db().await.unwrap();
    let deal = seed_deal(&db, dec!(50)).await;
    let tracker = price_tracker::create_tracker(&db, new_tracker(deal.id))
        .await
        .unwrap();

    let check_at = timestamps::now();
    let first = price_tracker::mark_checked(&db, tracker.id, check_at).await.unwrap();
    assert_eq!(first.last_check, Some(check_at));

    let again = price_tracker::mark_checked(&db, tracker.id, check_at).await.unwrap();
    assert_eq!(again.last_check, Some(check_at));
    assert_eq!(again.updated_at, first.updated_at);

    // Older checks never move last_check backwards
    let stale = price_tracker::mark_checked(&db, tracker.id, check_at - Duration::seconds(10))
        .await
        .unwrap();
    assert_eq!(stale.last_check, Some(check_at));
}

#[tokio::test]
async fn test_deactivated_tracker_never_fires() {
    let db = setup_test_db().await.unwrap();
    let deal = seed_deal(&db, dec!(100)).await;
    let tracker = price_tracker::create_tracker(&db, new_tracker(deal.id))
        .await
        .unwrap();

    let deactivated = price_tracker::deactivate_tracker(&db, tracker.id).await.unwrap();
    assert!(!deactivated.is_active);

    let (decision, unchanged) =
        price_tracker::run_check(&db, tracker.id, dec!(1), timestamps::now(), dec!(10))
            .await
            .unwrap();
    assert!(!decision.fire);
    assert_eq!(decision.reason, AlertReason::Inactive);
    assert!(unchanged.last_check.is_none());

    // Still present, only inactive
    assert!(price_tracker::get_tracker(&db, tracker.id).await.is_ok());
}

#[tokio::test]
async fn test_due_trackers() {
    let db = setup_test_db().await.unwrap();
    let deal = seed_deal(&db, dec!(100)).await;

    let fresh = price_tracker::create_tracker(&db, new_tracker(deal.id)).await.unwrap();
    let checked = price_tracker::create_tracker(&db, new_tracker(deal.id)).await.unwrap();
    let inactive = price_tracker::create_tracker(&db, new_tracker(deal.id)).await.unwrap();

    let now = timestamps::now();
    price_tracker::mark_checked(&db, checked.id, now).await.unwrap();
    price_tracker::deactivate_tracker(&db, inactive.id).await.unwrap();

    // Other tests may share the database, so only look at this deal's trackers
    let due_for_deal = |due: Vec<price_trackers::Model>| -> Vec<Uuid> {
        due.into_iter()
            .filter(|t| t.deal_id == deal.id)
            .map(|t| t.id)
            .collect()
    };

    let due = price_tracker::due_trackers(&db, now + Duration::seconds(60)).await.unwrap();
    assert_eq!(due_for_deal(due), vec![fresh.id]);

    // Never-checked trackers come before previously checked ones
    let due = price_tracker::due_trackers(&db, now + Duration::seconds(3600)).await.unwrap();
    assert_eq!(due_for_deal(due), vec![fresh.id, checked.id]);
}

#[tokio::test]
async fn test_create_tracker_validation() {
    let db = setup_test_db().await.unwrap();
    let deal = seed_deal(&db, dec!(100)).await;

    let result = price_tracker::create_tracker(
        &db,
        NewTracker {
            check_interval: 0,
            ..new_tracker(deal.id)
        },
    )
    .await;
    assert!(matches!(result, Err(CoreError::Validation(_))));

    let result = price_tracker::create_tracker(
        &db,
        NewTracker {
            threshold_price: Some(dec!(-5)),
            ..new_tracker(deal.id)
        },
    )
    .await;
    assert!(matches!(result, Err(CoreError::Validation(_))));

    for (initial_price, threshold_price) in [
        (Some(rust_decimal::Decimal::MAX), None),
        (None, Some(dec!(1000000000000))),
        (None, Some(dec!(79.123456789))),
    ] {
        let result = price_tracker::create_tracker(
            &db,
            NewTracker {
                initial_price,
                threshold_price,
                ..new_tracker(deal.id)
            },
        )
        .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    let result = price_tracker::create_tracker(&db, new_tracker(Uuid::new_v4())).await;
    assert!(matches!(result, Err(CoreError::NotFound { .. })));
}

#[tokio::test]
async fn test_check_rejects_unstorable_price() {
    let db = setup_test_db().await.unwrap();
    let drop_percent = CoreSettings::default().price_drop_alert_percent;
    let deal = seed_deal(&db, dec!(100)).await;
    let tracker = price_tracker::create_tracker(&db, new_tracker(deal.id)).await.unwrap();

    let result = price_tracker::run_check(
        &db,
        tracker.id,
        rust_decimal::Decimal::MAX,
        timestamps::now(),
        drop_percent,
    )
    .await;
    assert!(matches!(result, Err(CoreError::Validation(_))));

    // A rejected check does not consume the interval
    let tracker = price_tracker::get_tracker(&db, tracker.id).await.unwrap();
    assert!(tracker.last_check.is_none());
}

#[tokio::test]
async fn test_trackers_removed_with_deal() {
    let db = setup_test_db().await.unwrap();
    let deal = seed_deal(&db, dec!(100)).await;
    let tracker = price_tracker::create_tracker(&db, new_tracker(deal.id)).await.unwrap();

    deals::delete_deal(&db, deal.id).await.unwrap();

    let result = price_tracker::get_tracker(&db, tracker.id).await;
    assert!(matches!(result, Err(CoreError::NotFound { .. })));
}
