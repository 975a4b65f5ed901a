use async_trait::async_trait;
use ethers::{
    abi::{ self, Token },
    providers::{ Http, Middleware, Provider },
    types::{ transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, U256 },
    utils,
};

use crate::error::{ AppError, Result };
use crate::providers::{ ChainProvider, TokenConfig };

pub struct EvmProvider {
    provider: Provider<Http>,
    rpc_url: String,
}

impl EvmProvider {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>
            ::try_from(rpc_url)
            .map_err(|e| AppError::Rpc(format!("Failed to create provider: {}", e)))?;

        Ok(Self {
            provider,
            rpc_url: rpc_url.to_string(),
        })
    }
}

/// Calldata for ERC20 `balanceOf(address)`: selector followed by the
/// left-padded holder address.
pub fn balance_of_calldata(holder: Address) -> Bytes {
    let mut data = utils::id("balanceOf(address)").to_vec();
    data.extend(abi::encode(&[Token::Address(holder)]));
    Bytes::from(data)
}

/// Decode a `uint256` return value. An empty result means the target has no
/// code, so there is nothing to hold.
pub fn decode_uint256(output: &[u8]) -> Result<Option<U256>> {
    if output.is_empty() {
        return Ok(None);
    }
    if output.len() < 32 {
        return Err(AppError::Chain(format!("balanceOf returned {} bytes", output.len())));
    }
    Ok(Some(U256::from_big_endian(&output[..32])))
}

#[async_trait]
impl ChainProvider for EvmProvider {
    fn endpoint(&self) -> &str {
        &self.rpc_url
    }

    async fn get_native_balance(&self, address: &str) -> Result<U256> {
        let addr: Address = address
            .parse()
            .map_err(|_| AppError::InvalidAddress(address.to_string()))?;

        self.provider
            .get_balance(addr, None).await
            .map_err(|e| AppError::Rpc(format!("eth_getBalance failed: {}", e)))
    }

    async fn get_token_balance(&self, address: &str, token: &TokenConfig) -> Result<Option<U256>> {
        let holder: Address = address
            .parse()
            .map_err(|_| AppError::InvalidAddress(address.to_string()))?;
        let contract = token.contract_address
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput(format!("{} has no contract address", token.symbol)))?;
        let contract: Address = contract
            .parse()
            .map_err(|_| AppError::InvalidAddress(contract.to_string()))?;

        let tx: TypedTransaction = TransactionRequest::new()
            .to(contract)
            .data(balance_of_calldata(holder))
            .into();

        let output = self.provider
            .call(&tx, None).await
            .map_err(|e| AppError::Rpc(format!("eth_call balanceOf failed: {}", e)))?;

        decode_uint256(&output)
    }
}
