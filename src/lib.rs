pub mod config;
pub mod enums;
pub mod error;
pub mod providers;
pub mod chains;
pub mod rpc;
pub mod services;
pub mod scheduler;
pub mod events;
pub mod wallet;
pub mod api;
pub mod utils;

#[cfg(test)]
mod testing;

pub use config::{ ChainProfile, Config };
pub use enums::{ Chain, PriceSource };
pub use error::{ AppError, Result };
pub use events::{ BalanceEvent, EventBus };
pub use services::{ AddressSnapshot, BalanceAggregator, BalanceEntry, PriceService };
pub use wallet::WalletSignal;
