use std::collections::{ HashMap, HashSet };
use std::sync::{ Arc, Mutex as StdMutex };
use std::time::Duration;

use chrono::{ DateTime, Utc };
use serde::Serialize;
use tokio::sync::{ mpsc, Mutex, Notify, RwLock };
use tokio::task::JoinHandle;
use tokio::time::{ interval_at, Instant, MissedTickBehavior };
use uuid::Uuid;

use crate::chains::detect_chain;
use crate::config::ChainProfile;
use crate::enums::Chain;
use crate::error::{ AppError, Result };
use crate::events::{ BalanceEvent, EventBus };
use crate::services::balance_service::{ BalanceEntry, BalanceService, CycleBalances };
use crate::wallet::WalletSignal;

/// Point-in-time balances of one address, replaced as a unit every cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressSnapshot {
    pub chain: Chain,
    pub address: String,
    pub native: Option<BalanceEntry>,
    pub tokens: Vec<BalanceEntry>,
    pub total_usd: f64,
    /// Assets whose fetch resolved this cycle, zero balances included.
    pub resolved_assets: usize,
    pub last_update: DateTime<Utc>,
}

impl AddressSnapshot {
    fn assemble(chain: Chain, address: String, cycle: CycleBalances) -> Self {
        let total_usd =
            cycle.native
                .as_ref()
                .map(|n| n.usd_value)
                .unwrap_or(0.0) +
            cycle.tokens
                .iter()
                .map(|t| t.usd_value)
                .sum::<f64>();

        Self {
            chain,
            address,
            native: cycle.native,
            tokens: cycle.tokens,
            total_usd,
            resolved_assets: cycle.resolved_assets,
            last_update: Utc::now(),
        }
    }
}

/// Tracking state, guarded as one unit.
#[derive(Default)]
struct Registry {
    /// Polling task of each tracked address.
    trackers: HashMap<String, JoinHandle<()>>,
    /// Renewed on every start and every clear. Entries outlive their tracker
    /// so a clear is visible to cycles of untracked addresses too.
    sessions: HashMap<String, Uuid>,
}

impl Registry {
    fn session(&self, key: &str) -> Option<Uuid> {
        self.sessions.get(key).copied()
    }

    fn renew(&mut self, key: &str) -> Uuid {
        let session = Uuid::new_v4();
        self.sessions.insert(key.to_string(), session);
        session
    }
}

/// Removes the address from the in-flight set when the cycle ends, however
/// it ends, and wakes anyone waiting for it.
struct InFlightGuard<'a> {
    set: &'a StdMutex<HashSet<String>>,
    released: &'a Notify,
    key: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
        self.released.notify_waiters();
    }
}

/// Owns the per-address snapshot store and every polling task.
///
/// Lock order is `registry` then `snapshots`.
pub struct BalanceAggregator {
    profiles: HashMap<Chain, ChainProfile>,
    balance_service: Arc<BalanceService>,
    events: EventBus,
    refresh_interval: Duration,
    snapshots: RwLock<HashMap<String, AddressSnapshot>>,
    registry: Mutex<Registry>,
    in_flight: StdMutex<HashSet<String>>,
    released: Notify,
}

impl BalanceAggregator {
    pub fn new(
        profiles: HashMap<Chain, ChainProfile>,
        balance_service: Arc<BalanceService>,
        events: EventBus,
        refresh_interval: Duration
    ) -> Self {
        Self {
            profiles,
            balance_service,
            events,
            refresh_interval,
            snapshots: RwLock::new(HashMap::new()),
            registry: Mutex::new(Registry::default()),
            in_flight: StdMutex::new(HashSet::new()),
            released: Notify::new(),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn profile(&self, chain: Chain) -> Result<&ChainProfile> {
        self.profiles
            .get(&chain)
            .ok_or_else(|| AppError::UnsupportedChain(format!("{} is not configured", chain)))
    }

    /// Snapshot key for an address whose chain is not known up front.
    fn key_for(address: &str) -> String {
        match detect_chain(address.trim()) {
            Some(chain) => chain.normalize_address(address),
            None => address.trim().to_string(),
        }
    }

    fn try_begin(&self, key: &str) -> Option<InFlightGuard<'_>> {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(key.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            set: &self.in_flight,
            released: &self.released,
            key: key.to_string(),
        })
    }

    /// Wait until no cycle for `key` is running, then claim it.
    async fn begin(&self, key: &str) -> InFlightGuard<'_> {
        loop {
            let released = self.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            if let Some(guard) = self.try_begin(key) {
                return guard;
            }
            released.await;
        }
    }

    /// Run one fetch cycle for `address` and publish the result.
    ///
    /// Returns `Ok(None)` when another cycle for the same address is still
    /// running, or when the address was cleared or re-connected while this
    /// cycle ran; in both cases nothing is stored or published.
    pub async fn fetch_balances(&self, address: &str, chain: Chain) -> Result<Option<AddressSnapshot>> {
        let profile = self.profile(chain)?;
        let key = chain.normalize_address(address);

        let Some(guard) = self.try_begin(&key) else {
            tracing::debug!("Balance fetch for {} already in flight, skipping", key);
            return Ok(None);
        };

        Ok(self.run_cycle(guard, chain, profile).await)
    }

    async fn run_cycle(
        &self,
        guard: InFlightGuard<'_>,
        chain: Chain,
        profile: &ChainProfile
    ) -> Option<AddressSnapshot> {
        let key = guard.key.clone();
        let session = self.registry.lock().await.session(&key);

        let cycle = self.balance_service.fetch_all(&key, profile).await;
        let snapshot = AddressSnapshot::assemble(chain, key.clone(), cycle);

        let registry = self.registry.lock().await;
        if registry.session(&key) != session {
            tracing::debug!("Discarding balances for {}: tracking changed mid-cycle", key);
            return None;
        }

        self.snapshots.write().await.insert(key, snapshot.clone());
        self.events.publish(BalanceEvent::BalanceUpdated { snapshot: snapshot.clone() });
        drop(registry);
        drop(guard);

        Some(snapshot)
    }

    /// Poll `address` every refresh interval until it is cleared. Restarting
    /// an address replaces its task; other addresses are not affected.
    pub async fn start_real_time_updates(self: &Arc<Self>, address: &str, chain: Chain) -> Result<Uuid> {
        self.profile(chain)?;
        let key = chain.normalize_address(address);
        let period = self.refresh_interval;

        let weak = Arc::downgrade(self);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(aggregator) = weak.upgrade() else {
                    break;
                };
                if let Err(e) = aggregator.fetch_balances(&task_key, chain).await {
                    tracing::warn!("Scheduled balance fetch for {} failed: {}", task_key, e);
                }
            }
        });

        let mut registry = self.registry.lock().await;
        let session = registry.renew(&key);
        if let Some(previous) = registry.trackers.insert(key.clone(), handle) {
            previous.abort();
            tracing::debug!("Replaced polling task for {}", key);
        }

        tracing::info!(
            "Tracking {} on {} every {:?} (session {})",
            key,
            chain.display_name(),
            period,
            session
        );
        Ok(session)
    }

    /// Classify the address, start polling it and fetch right away. A cycle
    /// already running for the address is waited out, not skipped.
    pub async fn connect_wallet(self: &Arc<Self>, address: &str) -> Result<Option<AddressSnapshot>> {
        let chain = detect_chain(address.trim()).ok_or_else(||
            AppError::InvalidAddress(address.to_string())
        )?;
        let profile = self.profile(chain)?;

        self.start_real_time_updates(address, chain).await?;

        let guard = self.begin(&chain.normalize_address(address)).await;
        Ok(self.run_cycle(guard, chain, profile).await)
    }

    /// Stop polling `address`, drop its snapshot and tell consumers. Any
    /// cycle still running for it is discarded when it lands.
    /// Returns false if there was nothing to clear.
    pub async fn clear_balances(&self, address: &str) -> bool {
        let key = Self::key_for(address);

        let mut registry = self.registry.lock().await;
        let tracker = registry.trackers.remove(&key);
        if let Some(handle) = &tracker {
            handle.abort();
        }
        let had_snapshot = self.snapshots.write().await.remove(&key).is_some();
        let running = self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&key);

        if tracker.is_some() || had_snapshot || running {
            registry.renew(&key);
        }
        if tracker.is_none() && !had_snapshot {
            return false;
        }

        self.events.publish(BalanceEvent::BalancesCleared { address: key.clone() });
        drop(registry);

        tracing::info!("Stopped tracking {}", key);
        true
    }

    /// Clear every tracked or stored address. Returns how many were cleared.
    pub async fn clear_all(&self) -> usize {
        let mut keys: HashSet<String> = self.registry.lock().await.trackers.keys().cloned().collect();
        keys.extend(self.snapshots.read().await.keys().cloned());

        let mut cleared = 0;
        for key in keys {
            if self.clear_balances(&key).await {
                cleared += 1;
            }
        }
        cleared
    }

    pub async fn handle_signal(self: &Arc<Self>, signal: WalletSignal) {
        match signal {
            WalletSignal::Connected { address } => {
                if let Err(e) = self.connect_wallet(&address).await {
                    tracing::warn!("Ignoring wallet connection for {}: {}", address, e);
                }
            }
            WalletSignal::Disconnected { address: Some(address) } => {
                self.clear_balances(&address).await;
            }
            WalletSignal::Disconnected { address: None } => {
                let cleared = self.clear_all().await;
                tracing::info!("Wallet disconnected, cleared {} address(es)", cleared);
            }
        }
    }

    /// Follow the wallet collaborator until its channel closes.
    pub async fn run_wallet_signals(self: Arc<Self>, mut signals: mpsc::Receiver<WalletSignal>) {
        while let Some(signal) = signals.recv().await {
            self.handle_signal(signal).await;
        }
        tracing::debug!("Wallet signal channel closed");
    }

    pub async fn snapshot(&self, address: &str) -> Option<AddressSnapshot> {
        self.snapshots.read().await.get(&Self::key_for(address)).cloned()
    }

    pub async fn snapshots(&self) -> Vec<AddressSnapshot> {
        let mut all: Vec<AddressSnapshot> = self.snapshots.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.address.cmp(&b.address));
        all
    }

    pub async fn tracked_addresses(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.registry.lock().await.trackers.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Drop for BalanceAggregator {
    fn drop(&mut self) {
        for (_, handle) in self.registry.get_mut().trackers.drain() {
            handle.abort();
        }
    }
}
