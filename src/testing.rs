//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::U256;

use crate::error::{ AppError, Result };
use crate::providers::{ ChainProvider, PriceFeed, TokenConfig };

pub struct FakeChainProvider {
    name: String,
    native: Mutex<Option<U256>>,
    tokens: Mutex<HashMap<String, Option<Option<U256>>>>,
    delay: Option<Duration>,
    native_calls: AtomicUsize,
}

impl FakeChainProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            native: Mutex::new(Some(U256::zero())),
            tokens: Mutex::new(HashMap::new()),
            delay: None,
            native_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_native(self, raw: U256) -> Self {
        self.set_native(raw);
        self
    }

    pub fn failing_native(self) -> Self {
        *self.native.lock().unwrap() = None;
        self
    }

    /// `None` means the holder has no account for the token.
    pub fn with_token(self, contract: &str, raw: Option<U256>) -> Self {
        self.tokens.lock().unwrap().insert(contract.to_string(), Some(raw));
        self
    }

    pub fn failing_token(self, contract: &str) -> Self {
        self.tokens.lock().unwrap().insert(contract.to_string(), None);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_native(&self, raw: U256) {
        *self.native.lock().unwrap() = Some(raw);
    }

    pub fn native_calls(&self) -> usize {
        self.native_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainProvider for FakeChainProvider {
    fn endpoint(&self) -> &str {
        &self.name
    }

    async fn get_native_balance(&self, _address: &str) -> Result<U256> {
        self.native_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let native = *self.native.lock().unwrap();
        native.ok_or_else(|| AppError::Rpc(format!("{} is down", self.name)))
    }

    async fn get_token_balance(&self, _address: &str, token: &TokenConfig) -> Result<Option<U256>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let contract = token.contract_address.clone().unwrap_or_default();
        let entry = self.tokens.lock().unwrap().get(&contract).cloned();
        match entry {
            Some(Some(raw)) => Ok(raw),
            Some(None) => Err(AppError::Rpc(format!("{} failed for {}", self.name, token.symbol))),
            None => Ok(None),
        }
    }
}

pub struct FakePriceFeed {
    prices: Mutex<Option<HashMap<String, f64>>>,
    calls: AtomicUsize,
}

impl FakePriceFeed {
    pub fn new(prices: &[(&str, f64)]) -> Self {
        let feed = Self::unreachable();
        feed.set_prices(prices);
        feed
    }

    pub fn unreachable() -> Self {
        Self {
            prices: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_prices(&self, prices: &[(&str, f64)]) {
        let map = prices
            .iter()
            .map(|(symbol, usd)| (symbol.to_string(), *usd))
            .collect();
        *self.prices.lock().unwrap() = Some(map);
    }

    pub fn go_down(&self) {
        *self.prices.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFeed for FakePriceFeed {
    async fn fetch_usd_prices(&self, _symbols: &[String]) -> Result<HashMap<String, f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prices
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::External("price API unreachable".to_string()))
    }
}
