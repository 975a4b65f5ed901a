//! Typed notifications fanned out to any number of in-process consumers.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::services::AddressSnapshot;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BalanceEvent {
    BalanceUpdated {
        snapshot: AddressSnapshot,
    },
    BalancesCleared {
        address: String,
    },
}

impl BalanceEvent {
    pub fn address(&self) -> &str {
        match self {
            BalanceEvent::BalanceUpdated { snapshot } => &snapshot.address,
            BalanceEvent::BalancesCleared { address } => address,
        }
    }
}

/// Broadcast bus. Publishing never blocks; a consumer that falls more than
/// the channel capacity behind skips the oldest events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BalanceEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event. With no receivers the event is dropped.
    pub fn publish(&self, event: BalanceEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BalanceEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer that writes every event to the log until the bus closes.
pub async fn log_events(mut receiver: broadcast::Receiver<BalanceEvent>) {
    loop {
        match receiver.recv().await {
            Ok(BalanceEvent::BalanceUpdated { snapshot }) => {
                tracing::info!(
                    "{} {}: ${:.2} across {} token(s){}",
                    snapshot.chain,
                    snapshot.address,
                    snapshot.total_usd,
                    snapshot.tokens.len(),
                    snapshot.native
                        .as_ref()
                        .map(|n| format!(", native {}", n.formatted))
                        .unwrap_or_default()
                );
            }
            Ok(BalanceEvent::BalancesCleared { address }) => {
                tracing::info!("Balances cleared for {}", address);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Event logger lagged, skipped {} event(s)", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => {
                break;
            }
        }
    }
}
