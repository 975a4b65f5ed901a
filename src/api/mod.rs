use std::sync::Arc;

use axum::{ routing::{ delete, get, post }, Router };
use tower_http::{ cors::CorsLayer, trace::TraceLayer };

pub mod balance;
pub mod prices;
pub mod wallet;

use crate::services::{ BalanceAggregator, PriceService };

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<BalanceAggregator>,
    pub price_service: Arc<PriceService>,
}

impl AppState {
    pub fn new(aggregator: Arc<BalanceAggregator>, price_service: Arc<PriceService>) -> Self {
        Self {
            aggregator,
            price_service,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/prices", get(prices::get_prices))
        .route("/api/wallets/connect", post(wallet::connect_wallet))
        .route("/api/wallets/{address}", delete(wallet::disconnect_wallet))
        .route("/api/balances", get(balance::list_balances))
        .route("/api/balances/{address}", get(balance::get_balance))
        .route("/api/balances/{address}/refresh", post(balance::refresh_balance))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health_check() -> &'static str {
    "OK"
}
