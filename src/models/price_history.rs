//! Price history request/response models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::Uuid;
use serde::{Deserialize, Serialize};

use crate::entities::price_histories;
use crate::services::price_history::PriceTrend;

use super::deal::default_currency;

/// Upper bound on `limit` for a single history request
pub const MAX_HISTORY_LIMIT: u64 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct RecordPriceRequest {
    pub price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceHistoryQuery {
    pub limit: Option<u64>,
}

impl PriceHistoryQuery {
    pub fn validate(&self) -> Result<Option<u64>, String> {
        match self.limit {
            Some(0) => Err("limit must be >= 1".to_string()),
            Some(limit) if limit > MAX_HISTORY_LIMIT => Err(format!(
                "limit must be <= {}, got {}",
                MAX_HISTORY_LIMIT, limit
            )),
            other => Ok(other),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceHistoryEntry {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub price: Decimal,
    pub currency: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl From<price_histories::Model> for PriceHistoryEntry {
    fn from(entry: price_histories::Model) -> Self {
        PriceHistoryEntry {
            id: entry.id,
            deal_id: entry.deal_id,
            price: entry.price,
            currency: entry.currency,
            source: entry.source,
            created_at: entry.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceHistoryResponse {
    pub deal_id: Uuid,
    pub data: Vec<PriceHistoryEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceTrendResponse {
    pub deal_id: Uuid,
    #[serde(flatten)]
    pub trend: PriceTrend,
}
