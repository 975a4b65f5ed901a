use std::collections::HashMap;
use std::env;
use std::time::Duration;

use serde::Serialize;

use crate::chains::{ evm, solana };
use crate::enums::Chain;
use crate::providers::TokenConfig;

pub const DEFAULT_PRICE_API_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// Everything the aggregator knows about one chain.
#[derive(Debug, Clone, Serialize)]
pub struct ChainProfile {
    pub chain: Chain,
    pub native: TokenConfig,
    pub tokens: Vec<TokenConfig>,
    /// First entry is the primary endpoint, the rest are failover targets.
    pub rpc_urls: Vec<String>,
}

impl ChainProfile {
    /// Built-in profile: the chain's native asset plus its tracked tokens and,
    /// when configured, the project token.
    pub fn default_for(chain: Chain, rpc_urls: Vec<String>, project_token: Option<&str>) -> Self {
        let (native, mut tokens) = match chain {
            Chain::Ethereum => (evm::tokens::native_token(), evm::tokens::ERC20_TOKENS.clone()),
            Chain::Solana => (solana::tokens::native_token(), solana::tokens::SPL_TOKENS.clone()),
        };

        if let Some(address) = project_token {
            let decimals = if chain.is_evm() { 18 } else { 9 };
            tokens.push(TokenConfig::token("MNDM", address, decimals, "Mondo"));
        }

        Self {
            chain,
            native,
            tokens,
            rpc_urls,
        }
    }

    /// Native and token symbols, native first.
    pub fn symbols(&self) -> Vec<String> {
        std::iter
            ::once(&self.native)
            .chain(self.tokens.iter())
            .map(|t| t.symbol.clone())
            .collect()
    }

    fn default_rpc_urls(chain: Chain) -> Vec<String> {
        let urls: &[&str] = match chain {
            Chain::Ethereum => &["https://eth.llamarpc.com", "https://rpc.ankr.com/eth", "https://cloudflare-eth.com"],
            Chain::Solana =>
                &["https://api.mainnet-beta.solana.com", "https://solana-rpc.publicnode.com"],
        };
        urls.iter()
            .map(|s| s.to_string())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub chain_profiles: HashMap<Chain, ChainProfile>,
    pub price_api_url: String,
    pub balance_refresh_interval: Duration,
    pub price_refresh_interval: Duration,
    pub rpc_timeout: Duration,
    pub rpc_max_attempts: usize,
    pub server_host: String,
    pub server_port: u16,
    pub watch_addresses: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let mut chain_profiles = HashMap::new();

        for &chain in Chain::all() {
            let rpc_key = format!("{}_RPC_URLS", chain.env_prefix());
            let project_key = match chain {
                Chain::Ethereum => "MNDM_ETHEREUM_CONTRACT",
                Chain::Solana => "MNDM_SOLANA_MINT",
            };

            let rpc_urls = match env::var(&rpc_key) {
                Ok(val) => Self::parse_list(&val).ok_or_else(|| format!("{} cannot be empty", rpc_key))?,
                Err(_) => ChainProfile::default_rpc_urls(chain),
            };

            let project_token = env::var(project_key)
                .ok()
                .filter(|s| !s.trim().is_empty());
            if let Some(address) = &project_token {
                let valid = match chain {
                    Chain::Ethereum => evm::validate_address(address),
                    Chain::Solana => solana::validate_address(address),
                };
                if !valid {
                    return Err(format!("{} is not a valid {} address", project_key, chain).into());
                }
            }

            chain_profiles.insert(
                chain,
                ChainProfile::default_for(chain, rpc_urls, project_token.as_deref())
            );
        }

        let price_api_url = env::var("PRICE_API_URL").unwrap_or_else(|_|
            DEFAULT_PRICE_API_URL.to_string()
        );

        let balance_refresh_interval = Duration::from_secs(Self::parse_var("BALANCE_REFRESH_SECS", 30)?);
        let price_refresh_interval = Duration::from_secs(Self::parse_var("PRICE_REFRESH_SECS", 300)?);
        let rpc_timeout = Duration::from_secs(Self::parse_var("RPC_TIMEOUT_SECS", 10)?);
        let rpc_max_attempts: usize = Self::parse_var("RPC_MAX_ATTEMPTS", 3)?;

        if balance_refresh_interval.is_zero() || price_refresh_interval.is_zero() {
            return Err("Refresh intervals must be greater than zero".into());
        }
        if rpc_max_attempts == 0 {
            return Err("RPC_MAX_ATTEMPTS must be at least 1".into());
        }

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = Self::parse_var("SERVER_PORT", 8080)?;

        let watch_addresses = env::var("WATCH_ADDRESSES")
            .ok()
            .and_then(|val| Self::parse_list(&val))
            .unwrap_or_default();

        Ok(Config {
            chain_profiles,
            price_api_url,
            balance_refresh_interval,
            price_refresh_interval,
            rpc_timeout,
            rpc_max_attempts,
            server_host,
            server_port,
            watch_addresses,
        })
    }

    /// Comma separated list with blanks removed. `None` if nothing is left.
    fn parse_list(value: &str) -> Option<Vec<String>> {
        let items: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if items.is_empty() { None } else { Some(items) }
    }

    fn parse_var<T>(key: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
        where T: std::str::FromStr, T::Err: std::fmt::Display
    {
        match env::var(key) {
            Ok(val) => val.trim().parse().map_err(|e| format!("{} is invalid: {}", key, e).into()),
            Err(_) => Ok(default),
        }
    }

    /// Every symbol tracked on any configured chain, deduplicated, in a
    /// stable order.
    pub fn tracked_symbols(&self) -> Vec<String> {
        let mut chains: Vec<&Chain> = self.chain_profiles.keys().collect();
        chains.sort_by_key(|c| c.as_str());

        let mut symbols: Vec<String> = Vec::new();
        for chain in chains {
            for symbol in self.chain_profiles[chain].symbols() {
                if !symbols.contains(&symbol) {
                    symbols.push(symbol);
                }
            }
        }
        symbols
    }
}
