//! Deal endpoints
//!
//! POST /api/deals, GET /api/deals/{id}, PATCH /api/deals/{id}/status,
//! DELETE /api/deals/{id}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::prelude::Uuid;
use tracing::info;

use super::{api_error, ApiError};
use crate::models::deal::{CreateDealRequest, DealResponse, UpdateStatusRequest};
use crate::services::{deadline::with_deadline, deals};
use crate::AppState;

pub async fn create_deal(
    State(state): State<AppState>,
    Json(payload): Json<CreateDealRequest>,
) -> Result<(StatusCode, Json<DealResponse>), ApiError> {
    let deal = with_deadline(
        state.settings.operation_timeout,
        deals::create_deal(&state.db, payload.into()),
    )
    .await
    .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(deal.into())))
}

pub async fn get_deal(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
) -> Result<Json<DealResponse>, ApiError> {
    let deal = with_deadline(
        state.settings.operation_timeout,
        deals::get_deal(&state.db, deal_id),
    )
    .await
    .map_err(api_error)?;

    Ok(Json(deal.into()))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<DealResponse>, ApiError> {
    info!(deal_id = %deal_id, status = %payload.status, "Updating deal status");

    let deal = with_deadline(
        state.settings.operation_timeout,
        deals::transition_status(&state.db, deal_id, payload.status),
    )
    .await
    .map_err(api_error)?;

    Ok(Json(deal.into()))
}

pub async fn delete_deal(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    with_deadline(
        state.settings.operation_timeout,
        deals::delete_deal(&state.db, deal_id),
    )
    .await
    .map_err(api_error)?;

    Ok(StatusCode::NO_CONTENT)
}
