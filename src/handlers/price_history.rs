//! Price history endpoints
//!
//! POST /api/deals/{id}/prices, GET /api/deals/{id}/prices, GET /api/deals/{id}/trend

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::prelude::Uuid;
use tracing::info;

use super::{api_error, bad_request, ApiError};
use crate::models::price_history::{
    PriceHistoryEntry, PriceHistoryQuery, PriceHistoryResponse, PriceTrendResponse,
    RecordPriceRequest,
};
use crate::services::{deadline::with_deadline, price_history};
use crate::AppState;

pub async fn record_price(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
    Json(payload): Json<RecordPriceRequest>,
) -> Result<(StatusCode, Json<PriceHistoryEntry>), ApiError> {
    info!(deal_id = %deal_id, price = %payload.price, "Recording price point");

    let entry = with_deadline(
        state.settings.operation_timeout,
        price_history::record_price(
            &state.db,
            &state.settings,
            deal_id,
            payload.price,
            &payload.currency,
            &payload.source,
        ),
    )
    .await
    .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

pub async fn get_price_history(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
    Query(query): Query<PriceHistoryQuery>,
) -> Result<Json<PriceHistoryResponse>, ApiError> {
    let limit = query.validate().map_err(bad_request)?;

    let entries = with_deadline(
        state.settings.operation_timeout,
        price_history::get_history(&state.db, deal_id, limit),
    )
    .await
    .map_err(api_error)?;

    Ok(Json(PriceHistoryResponse {
        deal_id,
        data: entries.into_iter().map(PriceHistoryEntry::from).collect(),
    }))
}

pub async fn get_price_trend(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
) -> Result<Json<PriceTrendResponse>, ApiError> {
    let trend = with_deadline(
        state.settings.operation_timeout,
        price_history::compute_trend(&state.db, deal_id, state.settings.trend_window),
    )
    .await
    .map_err(api_error)?;

    Ok(Json(PriceTrendResponse { deal_id, trend }))
}
