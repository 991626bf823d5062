//! Price tracker endpoints
//!
//! POST /api/trackers, POST /api/trackers/{id}/check,
//! POST /api/trackers/{id}/deactivate

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::prelude::Uuid;

use super::{api_error, ApiError};
use crate::entities::price_trackers;
use crate::error::CoreResult;
use crate::models::tracker::{CheckTrackerRequest, CreateTrackerRequest, TrackerCheckResponse};
use crate::services::{deadline::with_deadline, deals, price_history, price_tracker, timestamps};
use crate::AppState;

pub async fn create_tracker(
    State(state): State<AppState>,
    Json(payload): Json<CreateTrackerRequest>,
) -> Result<(StatusCode, Json<price_trackers::Model>), ApiError> {
    let tracker = with_deadline(
        state.settings.operation_timeout,
        price_tracker::create_tracker(&state.db, payload.into()),
    )
    .await
    .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(tracker)))
}

/// Runs one scheduled check. Called by the external job runner.
pub async fn check_tracker(
    State(state): State<AppState>,
    Path(tracker_id): Path<Uuid>,
    Json(payload): Json<CheckTrackerRequest>,
) -> Result<Json<TrackerCheckResponse>, ApiError> {
    let response = with_deadline(
        state.settings.operation_timeout,
        run_check(&state, tracker_id, payload),
    )
    .await
    .map_err(api_error)?;

    Ok(Json(response))
}

async fn run_check(
    state: &AppState,
    tracker_id: Uuid,
    payload: CheckTrackerRequest,
) -> CoreResult<TrackerCheckResponse> {
    let latest_price = match payload.latest_price {
        Some(price) => price,
        None => {
            let tracker = price_tracker::get_tracker(&state.db, tracker_id).await?;
            match price_history::latest_price(&state.db, tracker.deal_id).await? {
                Some(price) => price,
                None => deals::get_deal(&state.db, tracker.deal_id).await?.price,
            }
        }
    };

    let (decision, tracker) = price_tracker::run_check(
        &state.db,
        tracker_id,
        latest_price,
        timestamps::now(),
        state.settings.price_drop_alert_percent,
    )
    .await?;

    Ok(TrackerCheckResponse {
        tracker,
        latest_price,
        decision,
    })
}

pub async fn deactivate_tracker(
    State(state): State<AppState>,
    Path(tracker_id): Path<Uuid>,
) -> Result<Json<price_trackers::Model>, ApiError> {
    let tracker = with_deadline(
        state.settings.operation_timeout,
        price_tracker::deactivate_tracker(&state.db, tracker_id),
    )
    .await
    .map_err(api_error)?;

    Ok(Json(tracker))
}
