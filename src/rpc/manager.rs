use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::chains::{ evm::EvmProvider, solana::SolanaProvider };
use crate::config::Config;
use crate::enums::Chain;
use crate::error::{ AppError, Result };
use crate::providers::ChainProvider;

struct ProviderPool {
    providers: Vec<Arc<dyn ChainProvider>>,
    current_index: RwLock<usize>,
}

/// Ordered RPC endpoints per chain with automatic failover.
///
/// Calls go to the current endpoint (initially the first configured one). A
/// failed or timed-out call rotates to the next endpoint and retries, up to
/// `max_attempts` calls in total. The manager keeps using whichever endpoint
/// last answered.
pub struct RpcManager {
    pools: HashMap<Chain, ProviderPool>,
    max_attempts: usize,
    call_timeout: Duration,
}

impl RpcManager {
    pub fn new(config: &Config) -> Result<Self> {
        let mut providers: HashMap<Chain, Vec<Arc<dyn ChainProvider>>> = HashMap::new();

        for (chain, profile) in &config.chain_profiles {
            let mut chain_providers: Vec<Arc<dyn ChainProvider>> = Vec::new();

            for url in &profile.rpc_urls {
                match chain {
                    Chain::Ethereum =>
                        match EvmProvider::new(url) {
                            Ok(provider) => chain_providers.push(Arc::new(provider)),
                            Err(e) =>
                                tracing::warn!("Failed to create Ethereum provider for {}: {}", url, e),
                        }
                    Chain::Solana => chain_providers.push(Arc::new(SolanaProvider::new(url))),
                }
            }

            if chain_providers.is_empty() {
                return Err(
                    AppError::Config(format!("No valid {} RPC providers configured", chain.display_name()))
                );
            }

            providers.insert(*chain, chain_providers);
        }

        Ok(Self::from_providers(providers, config.rpc_max_attempts, config.rpc_timeout))
    }

    pub fn from_providers(
        providers: HashMap<Chain, Vec<Arc<dyn ChainProvider>>>,
        max_attempts: usize,
        call_timeout: Duration
    ) -> Self {
        let pools = providers
            .into_iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(chain, providers)| {
                (
                    chain,
                    ProviderPool {
                        providers,
                        current_index: RwLock::new(0),
                    },
                )
            })
            .collect();

        Self {
            pools,
            max_attempts: max_attempts.max(1),
            call_timeout,
        }
    }

    /// Run `op` against the chain's providers, failing over on error.
    ///
    /// `InvalidAddress` and `InvalidInput` errors are returned immediately:
    /// another endpoint would reject the same input.
    pub async fn call<T, F, Fut>(&self, chain: Chain, op: F) -> Result<T>
        where F: Fn(Arc<dyn ChainProvider>) -> Fut, Fut: Future<Output = Result<T>>
    {
        let pool = self.pools
            .get(&chain)
            .ok_or_else(|| AppError::Rpc(format!("No {} providers available", chain.display_name())))?;

        let mut last_err = None;

        for attempt in 1..=self.max_attempts {
            let index = *pool.current_index.read().await;
            let provider = pool.providers[index].clone();

            let outcome = match tokio::time::timeout(self.call_timeout, op(provider.clone())).await {
                Ok(result) => result,
                Err(_) =>
                    Err(
                        AppError::Rpc(
                            format!("{} timed out after {:?}", provider.endpoint(), self.call_timeout)
                        )
                    ),
            };

            match outcome {
                Ok(value) => {
                    return Ok(value);
                }
                Err(e @ (AppError::InvalidAddress(_) | AppError::InvalidInput(_))) => {
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        "{} RPC call via {} failed (attempt {}/{}): {}",
                        chain.display_name(),
                        provider.endpoint(),
                        attempt,
                        self.max_attempts,
                        e
                    );
                    self.rotate_provider(chain, index).await;
                    last_err = Some(e);
                }
            }
        }

        Err(
            last_err.unwrap_or_else(||
                AppError::Rpc(format!("{} RPC call failed after retries", chain.display_name()))
            )
        )
    }

    /// Rotate to the next provider, unless a concurrent call already moved
    /// away from `failed_index`.
    async fn rotate_provider(&self, chain: Chain, failed_index: usize) {
        let Some(pool) = self.pools.get(&chain) else {
            return;
        };
        if pool.providers.len() < 2 {
            return;
        }

        let mut index = pool.current_index.write().await;
        if *index == failed_index {
            *index = (*index + 1) % pool.providers.len();
            tracing::info!(
                "Rotated {} provider to {}",
                chain.display_name(),
                pool.providers[*index].endpoint()
            );
        }
    }
}
