use std::sync::Arc;

use ethers::types::U256;
use futures::future::join_all;
use serde::{ Deserialize, Serialize };

use crate::config::ChainProfile;
use crate::error::Result;
use crate::providers::TokenConfig;
use crate::rpc::RpcManager;
use crate::services::price_service::{ PriceService, PriceSnapshot };
use crate::utils::{ format_balance, to_ui_amount };

/// One held asset, valued in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub symbol: String,
    pub name: String,
    pub balance: f64,
    pub usd_value: f64,
    pub formatted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

impl BalanceEntry {
    fn build(token: &TokenConfig, raw: U256, prices: Option<&PriceSnapshot>) -> Result<Self> {
        let balance = to_ui_amount(raw, token.decimals)?;
        let price = prices.and_then(|p| p.usd(&token.symbol)).unwrap_or(0.0);

        Ok(Self {
            symbol: token.symbol.clone(),
            name: token.display_name.clone(),
            balance,
            usd_value: balance * price,
            formatted: format_balance(balance, &token.symbol),
            contract_address: token.contract_address.clone(),
        })
    }
}

/// Everything one fetch cycle learned about an address.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleBalances {
    pub native: Option<BalanceEntry>,
    /// Non-zero token holdings, in profile order.
    pub tokens: Vec<BalanceEntry>,
    /// Assets whose fetch resolved, zero balances included.
    pub resolved_assets: usize,
}

/// Chain balance fetcher. Every failure is absorbed here: a `None` means
/// "unknown this cycle", never "zero".
pub struct BalanceService {
    rpc_manager: Arc<RpcManager>,
    price_service: Arc<PriceService>,
}

impl BalanceService {
    pub fn new(rpc_manager: Arc<RpcManager>, price_service: Arc<PriceService>) -> Self {
        Self {
            rpc_manager,
            price_service,
        }
    }

    pub async fn fetch_native_balance(&self, address: &str, profile: &ChainProfile) -> Option<BalanceEntry> {
        let prices = self.price_service.current().await;
        self.native_entry(address, profile, prices.as_deref()).await
    }

    pub async fn fetch_token_balance(
        &self,
        address: &str,
        profile: &ChainProfile,
        token: &TokenConfig
    ) -> Option<BalanceEntry> {
        let prices = self.price_service.current().await;
        self.token_entry(address, profile, token, prices.as_deref()).await
    }

    /// Native plus every configured token, all issued concurrently. The
    /// result is only returned once every sub-fetch has settled.
    pub async fn fetch_all(&self, address: &str, profile: &ChainProfile) -> CycleBalances {
        // one price snapshot for the whole cycle
        let prices = self.price_service.current().await;
        let prices = prices.as_deref();

        let token_fetches = profile.tokens
            .iter()
            .map(|token| self.token_entry(address, profile, token, prices));

        let (native, tokens) = tokio::join!(
            self.native_entry(address, profile, prices),
            join_all(token_fetches)
        );

        let resolved_assets =
            (native.is_some() as usize) +
            tokens
                .iter()
                .filter(|t| t.is_some())
                .count();

        let tokens = tokens
            .into_iter()
            .flatten()
            .filter(|entry| entry.balance > 0.0)
            .collect();

        CycleBalances {
            native,
            tokens,
            resolved_assets,
        }
    }

    async fn native_entry(
        &self,
        address: &str,
        profile: &ChainProfile,
        prices: Option<&PriceSnapshot>
    ) -> Option<BalanceEntry> {
        let raw = self.rpc_manager
            .call(profile.chain, |p| async move { p.get_native_balance(address).await }).await;

        let entry = raw.and_then(|raw| BalanceEntry::build(&profile.native, raw, prices));
        match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch {} balance for {}: {}",
                    profile.native.symbol,
                    address,
                    e
                );
                None
            }
        }
    }

    async fn token_entry(
        &self,
        address: &str,
        profile: &ChainProfile,
        token: &TokenConfig,
        prices: Option<&PriceSnapshot>
    ) -> Option<BalanceEntry> {
        let raw = self.rpc_manager
            .call(profile.chain, |p| async move { p.get_token_balance(address, token).await }).await;

        let entry = match raw {
            Ok(Some(raw)) => BalanceEntry::build(token, raw, prices),
            Ok(None) => {
                tracing::debug!("{} holds no {} account", address, token.symbol);
                return None;
            }
            Err(e) => Err(e),
        };

        match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping {} balance for {}: {}", token.symbol, address, e);
                None
            }
        }
    }
}
