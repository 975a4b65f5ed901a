pub mod address;
pub mod provider;
pub mod tokens;

pub use address::validate_address;
pub use provider::EvmProvider;
