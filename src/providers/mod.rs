pub mod chain_provider;
pub mod price_feed;

pub use chain_provider::{ ChainProvider, TokenConfig };
pub use price_feed::PriceFeed;
