//! Deal request/response models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::Uuid;
use serde::{Deserialize, Serialize};

use crate::entities::deals;
use crate::entities::sea_orm_active_enums::DealStatus;
use crate::services::deals::NewDeal;

pub(crate) fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDealRequest {
    pub title: String,
    pub url: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub source: String,
}

impl From<CreateDealRequest> for NewDeal {
    fn from(req: CreateDealRequest) -> Self {
        NewDeal {
            title: req.title,
            url: req.url,
            price: req.price,
            original_price: req.original_price,
            currency: req.currency,
            source: req.source,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: DealStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DealResponse {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    pub currency: String,
    pub source: String,
    pub status: DealStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<deals::Model> for DealResponse {
    fn from(deal: deals::Model) -> Self {
        DealResponse {
            id: deal.id,
            title: deal.title,
            url: deal.url,
            price: deal.price,
            original_price: deal.original_price,
            currency: deal.currency,
            source: deal.source,
            status: deal.status,
            created_at: deal.created_at.with_timezone(&Utc),
            updated_at: deal.updated_at.with_timezone(&Utc),
        }
    }
}
