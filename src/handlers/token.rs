//! Token ledger endpoints
//!
//! GET /api/tokens/{user_id}/balance,
//! POST /api/tokens/{user_id}/transactions,
//! GET /api/tokens/{user_id}/transactions?page=&size=

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::prelude::Uuid;

use super::{api_error, ApiError};
use crate::entities::token_transactions;
use crate::models::token::{
    ApplyTransactionRequest, BalanceResponse, TransactionHistoryQuery, TransactionResponse,
};
use crate::services::deadline::with_deadline;
use crate::services::token_ledger::{LedgerReconciliation, Page};
use crate::AppState;

pub async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = with_deadline(
        state.settings.operation_timeout,
        state.token_ledger.get_balance(user_id),
    )
    .await
    .map_err(api_error)?;

    Ok(Json(BalanceResponse { user_id, balance }))
}

pub async fn apply_transaction(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ApplyTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let (balance, transaction) = with_deadline(
        state.settings.operation_timeout,
        state.token_ledger.apply_transaction(
            user_id,
            payload.transaction_type,
            payload.amount,
            payload.meta_data,
        ),
    )
    .await
    .map_err(api_error)?;

    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse {
            balance,
            transaction,
        }),
    ))
}

pub async fn get_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<TransactionHistoryQuery>,
) -> Result<Json<Page<token_transactions::Model>>, ApiError> {
    let page = with_deadline(
        state.settings.operation_timeout,
        state.token_ledger.get_history(user_id, query.page, query.size),
    )
    .await
    .map_err(api_error)?;

    Ok(Json(page))
}

pub async fn reconcile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<LedgerReconciliation>, ApiError> {
    let report = with_deadline(
        state.settings.operation_timeout,
        state.token_ledger.reconcile(user_id),
    )
    .await
    .map_err(api_error)?;

    Ok(Json(report))
}
