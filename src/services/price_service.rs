use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };
use tokio::sync::RwLock;

use crate::enums::PriceSource;
use crate::error::{ AppError, Result };
use crate::providers::PriceFeed;

const MAX_RETRIES: u32 = 3;

/// Approximate prices installed when the very first refresh fails, so that
/// valuations do not silently collapse to zero.
const FALLBACK_PRICES: &[(&str, f64)] = &[
    ("ETH", 2000.0),
    ("SOL", 100.0),
    ("USDC", 1.0),
    ("USDT", 1.0),
    ("MNDM", 0.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsdQuote {
    pub usd: f64,
}

/// Process-wide price table. Always replaced as a whole, never patched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSnapshot {
    pub prices: HashMap<String, UsdQuote>,
    pub source: PriceSource,
    pub fetched_at: DateTime<Utc>,
}

impl PriceSnapshot {
    pub fn live(prices: HashMap<String, f64>) -> Self {
        Self {
            prices: prices
                .into_iter()
                .map(|(symbol, usd)| (symbol.to_uppercase(), UsdQuote { usd }))
                .collect(),
            source: PriceSource::Live,
            fetched_at: Utc::now(),
        }
    }

    pub fn fallback() -> Self {
        Self {
            prices: FALLBACK_PRICES.iter()
                .map(|(symbol, usd)| (symbol.to_string(), UsdQuote { usd: *usd }))
                .collect(),
            source: PriceSource::Fallback,
            fetched_at: Utc::now(),
        }
    }

    pub fn usd(&self, symbol: &str) -> Option<f64> {
        self.prices.get(&symbol.to_uppercase()).map(|q| q.usd)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Price oracle cache for a fixed symbol set.
pub struct PriceService {
    feed: Arc<dyn PriceFeed>,
    symbols: Vec<String>,
    snapshot: RwLock<Option<Arc<PriceSnapshot>>>,
}

impl PriceService {
    pub fn new(feed: Arc<dyn PriceFeed>, symbols: Vec<String>) -> Self {
        Self {
            feed,
            symbols: symbols
                .into_iter()
                .map(|s| s.to_uppercase())
                .collect(),
            snapshot: RwLock::new(None),
        }
    }

    /// Pull a fresh batch of prices and swap it in.
    ///
    /// On failure the current snapshot stays as it is. If there has never
    /// been one, the fallback table is installed instead.
    pub async fn refresh(&self) {
        match self.feed.fetch_usd_prices(&self.symbols).await {
            Ok(prices) if !prices.is_empty() => {
                let snapshot = PriceSnapshot::live(prices);
                tracing::debug!("Price snapshot refreshed with {} {} symbols", snapshot.len(), snapshot.source);
                *self.snapshot.write().await = Some(Arc::new(snapshot));
            }
            Ok(_) => {
                self.keep_or_install_fallback("price API returned no known symbols").await;
            }
            Err(e) => {
                self.keep_or_install_fallback(&e.to_string()).await;
            }
        }
    }

    async fn keep_or_install_fallback(&self, reason: &str) {
        let mut snapshot = self.snapshot.write().await;
        if snapshot.is_none() {
            tracing::warn!("Price refresh failed ({}); installing fallback prices", reason);
            *snapshot = Some(Arc::new(PriceSnapshot::fallback()));
        } else {
            tracing::warn!("Price refresh failed ({}); keeping previous prices", reason);
        }
    }

    /// Current snapshot, `None` until the first refresh has run.
    pub async fn current(&self) -> Option<Arc<PriceSnapshot>> {
        self.snapshot.read().await.clone()
    }
}

// ─── CoinGecko feed ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CoinGeckoQuote {
    usd: Option<f64>,
}

/// Batched `simple/price` client.
pub struct CoinGeckoFeed {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoFeed {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client
            ::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_url(&self, ids: &[&str]) -> String {
        format!(
            "{}?ids={}&vs_currencies=usd",
            self.base_url,
            urlencoding::encode(&ids.join(","))
        )
    }

    /// Fetch a URL with retry on 429 rate-limit responses
    async fn fetch_with_retry(&self, url: &str) -> Result<reqwest::Response> {
        let mut last_err = None;
        for attempt in 0..MAX_RETRIES {
            let response = self.client
                .get(url)
                .send().await
                .map_err(|e| AppError::External(format!("CoinGecko request failed: {}", e)))?;

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                last_err = Some(AppError::External("CoinGecko rate limited".to_string()));
                if let Some(wait) = rate_limit_backoff(attempt) {
                    tokio::time::sleep(wait).await;
                }
                continue;
            }

            if !response.status().is_success() {
                return Err(
                    AppError::External(format!("CoinGecko returned status: {}", response.status()))
                );
            }

            return Ok(response);
        }
        Err(
            last_err.unwrap_or_else(||
                AppError::External("CoinGecko request failed after retries".to_string())
            )
        )
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoFeed {
    async fn fetch_usd_prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>> {
        let pairs: Vec<(String, &'static str)> = symbols
            .iter()
            .map(|s| s.to_uppercase())
            .filter_map(|s| symbol_to_coingecko_id(&s).map(|id| (s, id)))
            .collect();

        if pairs.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<&str> = pairs
            .iter()
            .map(|(_, id)| *id)
            .collect();
        let response = self.fetch_with_retry(&self.build_url(&ids)).await?;

        let body: HashMap<String, CoinGeckoQuote> = response
            .json().await
            .map_err(|e| AppError::External(format!("Failed to parse CoinGecko response: {}", e)))?;

        Ok(quotes_to_prices(&pairs, &body))
    }
}

/// Wait before retrying after a 429 on `attempt`. Nothing after the last
/// attempt, since no retry follows.
fn rate_limit_backoff(attempt: u32) -> Option<Duration> {
    if attempt + 1 >= MAX_RETRIES {
        return None;
    }
    Some(Duration::from_secs(2u64.pow(attempt + 1)))
}

/// Map CoinGecko's `{ id: { usd } }` body back onto the requested symbols.
/// Symbols the body does not quote are left out.
fn quotes_to_prices(
    pairs: &[(String, &str)],
    body: &HashMap<String, CoinGeckoQuote>
) -> HashMap<String, f64> {
    pairs
        .iter()
        .filter_map(|(symbol, id)| {
            body.get(*id)
                .and_then(|q| q.usd)
                .map(|usd| (symbol.clone(), usd))
        })
        .collect()
}

/// Map a token symbol to its CoinGecko id.
fn symbol_to_coingecko_id(symbol: &str) -> Option<&'static str> {
    let id = match symbol {
        "ETH" | "WETH" => "ethereum",
        "SOL" | "WSOL" => "solana",
        "USDC" => "usd-coin",
        "USDT" => "tether",
        "DAI" => "dai",
        "BTC" | "WBTC" => "bitcoin",
        "BONK" => "bonk",
        "JUP" => "jupiter-exchange-solana",
        _ => {
            return None;
        }
    };
    Some(id)
}
