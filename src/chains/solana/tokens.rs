use lazy_static::lazy_static;

use crate::providers::TokenConfig;

lazy_static! {
    /// SPL tokens tracked on Solana mainnet, in display order.
    pub static ref SPL_TOKENS: Vec<TokenConfig> = vec![
        TokenConfig::token("USDC", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", 6, "USD Coin"),
        TokenConfig::token("USDT", "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", 6, "Tether USD"),
    ];
}

pub fn native_token() -> TokenConfig {
    TokenConfig::native("SOL", 9, "Solana")
}
