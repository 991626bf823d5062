//! Price tracker request/response models

use rust_decimal::Decimal;
use sea_orm::prelude::Uuid;
use serde::{Deserialize, Serialize};

use crate::entities::price_trackers;
use crate::services::price_tracker::{AlertDecision, NewTracker};

fn default_check_interval() -> i32 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrackerRequest {
    pub deal_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub initial_price: Option<Decimal>,
    #[serde(default)]
    pub threshold_price: Option<Decimal>,
    /// Seconds between checks (defaults to one hour)
    #[serde(default = "default_check_interval")]
    pub check_interval: i32,
}

impl From<CreateTrackerRequest> for NewTracker {
    fn from(req: CreateTrackerRequest) -> Self {
        NewTracker {
            deal_id: req.deal_id,
            user_id: req.user_id,
            initial_price: req.initial_price,
            threshold_price: req.threshold_price,
            check_interval: req.check_interval,
        }
    }
}

/// Body of a scheduled check. Without a price the deal's current price is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckTrackerRequest {
    #[serde(default)]
    pub latest_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackerCheckResponse {
    pub tracker: price_trackers::Model,
    pub latest_price: Decimal,
    #[serde(flatten)]
    pub decision: AlertDecision,
}
