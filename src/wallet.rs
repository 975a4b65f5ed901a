use serde::{ Deserialize, Serialize };

/// Lifecycle signals from the wallet-connection layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalletSignal {
    Connected {
        address: String,
    },
    /// `None` disconnects every tracked address.
    Disconnected {
        address: Option<String>,
    },
}
