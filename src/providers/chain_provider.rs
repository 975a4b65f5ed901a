use async_trait::async_trait;
use ethers::types::U256;
use serde::{ Deserialize, Serialize };

use crate::error::Result;

/// Static description of an asset tracked on a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
    /// ERC20 contract or SPL mint. `None` for the chain's native asset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    pub decimals: u8,
    pub display_name: String,
}

impl TokenConfig {
    pub fn native(symbol: &str, decimals: u8, display_name: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            contract_address: None,
            decimals,
            display_name: display_name.to_string(),
        }
    }

    pub fn token(symbol: &str, contract_address: &str, decimals: u8, display_name: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            contract_address: Some(contract_address.to_string()),
            decimals,
            display_name: display_name.to_string(),
        }
    }
}

/// One RPC endpoint of one chain. Balances come back in base units
/// (wei, lamports, token atoms); conversion happens in the fetcher.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// URL this provider talks to, for logging.
    fn endpoint(&self) -> &str;

    /// Get native asset balance
    async fn get_native_balance(&self, address: &str) -> Result<U256>;

    /// Get token balance (ERC20/SPL).
    ///
    /// `Ok(None)` means the holder has no account for the token, which is
    /// not an error.
    async fn get_token_balance(&self, address: &str, token: &TokenConfig) -> Result<Option<U256>>;
}
