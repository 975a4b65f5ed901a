use std::fmt;

use serde::{ Deserialize, Serialize };

// ─── Chain ───────────────────────────────────────────────────────────

/// Supported blockchain networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Solana,
}

impl Chain {
    /// Canonical identifier used in snapshots and notifications.
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Solana => "solana",
        }
    }

    /// Prefix for the chain's environment variables.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ETHEREUM",
            Chain::Solana => "SOLANA",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Chain::Ethereum => "Ethereum",
            Chain::Solana => "Solana",
        }
    }

    /// Whether this chain uses the EVM (Ethereum Virtual Machine).
    pub fn is_evm(&self) -> bool {
        matches!(self, Chain::Ethereum)
    }

    /// Key under which snapshots for `address` are stored.
    ///
    /// EVM addresses are case-insensitive hex, so they are lowercased; base58
    /// addresses are case-sensitive and kept verbatim.
    pub fn normalize_address(&self, address: &str) -> String {
        let trimmed = address.trim();
        if self.is_evm() {
            trimmed.to_lowercase()
        } else {
            trimmed.to_string()
        }
    }

    pub fn all() -> &'static [Chain] {
        &[Chain::Ethereum, Chain::Solana]
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── PriceSource ─────────────────────────────────────────────────────

/// Where the current price snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Live,
    Fallback,
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::Live => "live",
            PriceSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
