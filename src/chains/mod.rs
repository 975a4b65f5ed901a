pub mod evm;
pub mod solana;

use crate::enums::Chain;

/// Classify an address by its shape.
///
/// `0x` followed by 40 hex characters is Ethereum, a 43 or 44 character
/// base58 string is Solana. Anything else is unclassifiable and must not be
/// fetched.
pub fn detect_chain(address: &str) -> Option<Chain> {
    if evm::validate_address(address) {
        Some(Chain::Ethereum)
    } else if solana::validate_address(address) {
        Some(Chain::Solana)
    } else {
        None
    }
}
