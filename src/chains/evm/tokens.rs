use lazy_static::lazy_static;

use crate::providers::TokenConfig;

lazy_static! {
    /// ERC20 tokens tracked on Ethereum mainnet, in display order.
    pub static ref ERC20_TOKENS: Vec<TokenConfig> = vec![
        TokenConfig::token("USDC", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6, "USD Coin"),
        TokenConfig::token("USDT", "0xdAC17F958D2ee523a2206206994597C13D831ec7", 6, "Tether USD"),
    ];
}

pub fn native_token() -> TokenConfig {
    TokenConfig::native("ETH", 18, "Ethereum")
}
