use std::sync::Arc;

use anyhow::Context;
use balance_aggregator::{
    api::{ self, AppState },
    events::{ self, EventBus },
    rpc::RpcManager,
    scheduler::Scheduler,
    services::{ BalanceAggregator, BalanceService, CoinGeckoFeed, PriceService },
    Config,
    WalletSignal,
};
use tokio::sync::mpsc;
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "balance_aggregator=debug,tower_http=debug".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    tracing::info!(
        "Starting balance-aggregator for {} symbol(s), balances every {:?}, prices every {:?}",
        config.tracked_symbols().len(),
        config.balance_refresh_interval,
        config.price_refresh_interval
    );

    let rpc_manager = Arc::new(RpcManager::new(&config).context("Failed to build RPC providers")?);
    tracing::info!("RPC manager initialized");

    let feed = Arc::new(CoinGeckoFeed::new(&config.price_api_url)?);
    let price_service = Arc::new(PriceService::new(feed, config.tracked_symbols()));

    // Prices first so the first balance cycle is valued
    price_service.refresh().await;
    tokio::spawn(Scheduler::new(price_service.clone(), config.price_refresh_interval).start());

    let events = EventBus::new();
    tokio::spawn(events::log_events(events.subscribe()));

    let balance_service = Arc::new(BalanceService::new(rpc_manager, price_service.clone()));
    let aggregator = Arc::new(
        BalanceAggregator::new(
            config.chain_profiles.clone(),
            balance_service,
            events,
            config.balance_refresh_interval
        )
    );

    let (wallet_tx, wallet_rx) = mpsc::channel(32);
    let signals = tokio::spawn(aggregator.clone().run_wallet_signals(wallet_rx));

    for address in &config.watch_addresses {
        wallet_tx
            .send(WalletSignal::Connected { address: address.clone() }).await
            .context("Wallet signal channel closed")?;
    }

    let app = api::router(AppState::new(aggregator.clone(), price_service));

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener
        ::bind(&addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    wallet_tx.send(WalletSignal::Disconnected { address: None }).await.ok();
    drop(wallet_tx);
    signals.await.ok();

    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
