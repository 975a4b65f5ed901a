use ethers::types::U256;

use crate::error::{ AppError, Result };

/// Convert a base-unit integer into human units using the asset's decimals.
pub fn to_ui_amount(raw: U256, decimals: u8) -> Result<f64> {
    let formatted = ethers::utils
        ::format_units(raw, decimals as u32)
        .map_err(|e| AppError::Chain(format!("Failed to format balance: {}", e)))?;

    formatted
        .parse::<f64>()
        .map_err(|e| AppError::Chain(format!("Failed to parse balance {}: {}", formatted, e)))
}
