//! Deal persistence: creation, lookup, status lifecycle, cascading delete.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QuerySelect, Set,
    TransactionTrait,
};
use sea_orm::prelude::Uuid;
use tracing::{info, warn};

use crate::entities::{deals, prelude::Deals, sea_orm_active_enums::DealStatus};
use crate::error::{CoreError, CoreResult};
use crate::services::{deal_price, timestamps};

#[derive(Debug, Clone)]
pub struct NewDeal {
    pub title: String,
    pub url: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub currency: String,
    pub source: String,
}

/// Upper-cases and checks a three-letter currency code.
pub fn normalize_currency(currency: &str) -> CoreResult<String> {
    let code = currency.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::validation(format!(
            "currency must be a three-letter code, got '{}'",
            currency
        )));
    }
    Ok(code.to_ascii_uppercase())
}

/// Longest source name the `source` columns hold
pub const MAX_SOURCE_LEN: usize = 64;

/// Trims a source name and checks it fits its column.
pub fn normalize_source(source: &str) -> CoreResult<String> {
    let source = require_non_empty("source", source)?;
    if source.chars().count() > MAX_SOURCE_LEN {
        return Err(CoreError::validation(format!(
            "source must be at most {} characters",
            MAX_SOURCE_LEN
        )));
    }
    Ok(source)
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

pub async fn create_deal(db: &DatabaseConnection, new_deal: NewDeal) -> CoreResult<deals::Model> {
    let title = require_non_empty("title", &new_deal.title)?;
    let url = require_non_empty("url", &new_deal.url)?;
    let source = normalize_source(&new_deal.source)?;
    let currency = normalize_currency(&new_deal.currency)?;
    deal_price::validate_price_pair(new_deal.price, new_deal.original_price)?;

    let now = timestamps::now();
    let deal = deals::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        url: Set(url),
        price: Set(new_deal.price),
        original_price: Set(new_deal.original_price),
        currency: Set(currency),
        source: Set(source),
        status: Set(DealStatus::Active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    info!(deal_id = %deal.id, price = %deal.price, source = %deal.source, "Deal created");
    Ok(deal)
}

pub async fn get_deal<C>(db: &C, deal_id: Uuid) -> CoreResult<deals::Model>
where
    C: ConnectionTrait,
{
    Deals::find_by_id(deal_id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::not_found("deal", deal_id))
}

/// Loads a deal with a row lock held until the surrounding transaction ends.
pub(crate) async fn lock_deal<C>(txn: &C, deal_id: Uuid) -> CoreResult<deals::Model>
where
    C: ConnectionTrait,
{
    Deals::find_by_id(deal_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| CoreError::not_found("deal", deal_id))
}

pub async fn transition_status(
    db: &DatabaseConnection,
    deal_id: Uuid,
    to: DealStatus,
) -> CoreResult<deals::Model> {
    let txn = db.begin().await?;
    let deal = lock_deal(&txn, deal_id).await?;
    let from = deal.status;

    if let Err(e) = deal_price::validate_transition(from, to) {
        warn!(deal_id = %deal_id, from = %from, to = %to, "Rejected deal status transition");
        return Err(e);
    }
    if from == to {
        txn.commit().await?;
        return Ok(deal);
    }

    let mut active_model: deals::ActiveModel = deal.into();
    active_model.status = Set(to);
    active_model.updated_at = Set(timestamps::now());
    let updated = active_model.update(&txn).await?;
    txn.commit().await?;

    info!(deal_id = %deal_id, from = %from, to = %to, "Deal status changed");
    Ok(updated)
}

/// Deletes a deal. Price history and trackers go with it via cascading keys.
pub async fn delete_deal(db: &DatabaseConnection, deal_id: Uuid) -> CoreResult<()> {
    let result = Deals::delete_by_id(deal_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(CoreError::not_found("deal", deal_id));
    }
    info!(deal_id = %deal_id, "Deal deleted");
    Ok(())
}
