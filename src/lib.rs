// src/lib.rs

use axum::{
    routing::{get, post},
    Router,
};
use config::CoreSettings;
use sea_orm::DatabaseConnection;
use services::{balance_cache::BalanceCache, token_ledger::TokenLedgerService};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub settings: Arc<CoreSettings>,
    pub token_ledger: TokenLedgerService,
}

impl AppState {
    pub fn new(db: DatabaseConnection, settings: CoreSettings) -> Self {
        let cache = BalanceCache::new(settings.balance_cache_ttl, settings.balance_cache_capacity);
        let token_ledger = TokenLedgerService::new(db.clone(), cache);
        Self {
            db,
            settings: Arc::new(settings),
            token_ledger,
        }
    }
}

pub mod entities {
    pub mod prelude;
    pub mod sea_orm_active_enums;
    pub mod deals;
    pub mod price_histories;
    pub mod price_trackers;
    pub mod token_balances;
    pub mod token_transactions;
}

pub mod services {
    pub mod timestamps;
    pub mod deadline;
    pub mod deal_price;
    pub mod deals;
    pub mod price_history;
    pub mod price_tracker;
    pub mod balance_cache;
    pub mod token_ledger;
}

pub mod config;
pub mod error;
pub mod models;
pub mod handlers;

/// Full API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/deals", post(handlers::deals::create_deal))
        .route(
            "/api/deals/{id}",
            get(handlers::deals::get_deal).delete(handlers::deals::delete_deal),
        )
        .route(
            "/api/deals/{id}/status",
            axum::routing::patch(handlers::deals::update_status),
        )
        .route(
            "/api/deals/{id}/prices",
            post(handlers::price_history::record_price)
                .get(handlers::price_history::get_price_history),
        )
        .route(
            "/api/deals/{id}/trend",
            get(handlers::price_history::get_price_trend),
        )
        .route("/api/trackers", post(handlers::tracker::create_tracker))
        .route(
            "/api/trackers/{id}/check",
            post(handlers::tracker::check_tracker),
        )
        .route(
            "/api/trackers/{id}/deactivate",
            post(handlers::tracker::deactivate_tracker),
        )
        .route(
            "/api/tokens/{user_id}/balance",
            get(handlers::token::get_balance),
        )
        .route(
            "/api/tokens/{user_id}/transactions",
            post(handlers::token::apply_transaction).get(handlers::token::get_transactions),
        )
        .route(
            "/api/tokens/{user_id}/reconcile",
            get(handlers::token::reconcile),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
