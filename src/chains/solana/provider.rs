use async_trait::async_trait;
use ethers::types::U256;
use solana_client::{ nonblocking::rpc_client::RpcClient, rpc_request::TokenAccountsFilter };
use solana_commitment_config::CommitmentConfig;
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

use crate::error::{ AppError, Result };
use crate::providers::{ ChainProvider, TokenConfig };

pub struct SolanaProvider {
    client: RpcClient,
    rpc_url: String,
}

impl SolanaProvider {
    pub fn new(rpc_url: &str) -> Self {
        let client = RpcClient::new_with_commitment(
            rpc_url.to_string(),
            CommitmentConfig::confirmed()
        );

        Self {
            client,
            rpc_url: rpc_url.to_string(),
        }
    }

    fn parse_pubkey(value: &str) -> Result<Pubkey> {
        Pubkey::from_str(value).map_err(|_| AppError::InvalidAddress(value.to_string()))
    }
}

/// Raw amount of a `jsonParsed` SPL token account, read from
/// `parsed.info.tokenAmount.amount`.
fn parsed_token_amount(data: &Value) -> Result<U256> {
    let amount = data
        .pointer("/parsed/info/tokenAmount/amount")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Chain("Token account is not jsonParsed".to_string()))?;

    U256::from_dec_str(amount).map_err(|_| AppError::Chain(format!("Bad token amount: {}", amount)))
}

#[async_trait]
impl ChainProvider for SolanaProvider {
    fn endpoint(&self) -> &str {
        &self.rpc_url
    }

    async fn get_native_balance(&self, address: &str) -> Result<U256> {
        let pubkey = Self::parse_pubkey(address)?;

        let lamports: u64 = self.client
            .get_balance(&pubkey).await
            .map_err(|e| AppError::Rpc(format!("getBalance failed: {}", e)))?;

        Ok(U256::from(lamports))
    }

    async fn get_token_balance(&self, address: &str, token: &TokenConfig) -> Result<Option<U256>> {
        let owner = Self::parse_pubkey(address)?;
        let mint = token.contract_address
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput(format!("{} has no mint address", token.symbol)))
            .and_then(Self::parse_pubkey)?;

        let accounts = self.client
            .get_token_accounts_by_owner(&owner, TokenAccountsFilter::Mint(mint)).await
            .map_err(|e| AppError::Rpc(format!("getTokenAccountsByOwner failed: {}", e)))?;

        if accounts.is_empty() {
            return Ok(None);
        }

        // A holder may own several accounts for one mint; the balance is their sum.
        let mut total = U256::zero();
        for keyed in accounts {
            let data = serde_json
                ::to_value(&keyed.account.data)
                .map_err(|e| AppError::Chain(format!("Unreadable token account {}: {}", keyed.pubkey, e)))?;
            total += parsed_token_amount(&data)?;
        }

        Ok(Some(total))
    }
}
