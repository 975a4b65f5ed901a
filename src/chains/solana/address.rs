/// 43 or 44 characters from the base58 alphabet.
pub fn validate_address(address: &str) -> bool {
    matches!(address.len(), 43 | 44) && bs58::decode(address).into_vec().is_ok()
}
