pub mod price_service;
pub mod balance_service;
pub mod balance_aggregator;

pub use price_service::{ CoinGeckoFeed, PriceService, PriceSnapshot, UsdQuote };
pub use balance_service::{ BalanceEntry, BalanceService, CycleBalances };
pub use balance_aggregator::{ AddressSnapshot, BalanceAggregator };
