//! EVM chain adapter: native ETH and ERC-20 transfers over JSON-RPC, signed
//! locally with a hex-encoded secp256k1 private key.
//!
//! Built on Alloy, without any signed-authorization (EIP-3009/6492) style
//! machinery — this adapter only ever needs a plain signed transfer, a
//! balance read, a receipt poll and the latest block height.

use std::collections::HashMap;
use std::str::FromStr;

use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::sol;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use url::Url;

use crate::chain::{ChainAdapter, GeneratedKeypair, Receipt};
use crate::error::ChainError;
use crate::types::{Network, Token};

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function mint(address to, uint256 amount) external;
    }
}

fn network_error(message: impl Into<String>) -> ChainError {
    ChainError::Network {
        network: Network::Ethereum,
        message: message.into(),
    }
}

/// Converts a human-readable amount to the token's atomic unit (wei /
/// smallest ERC-20 unit), scaled by `decimals`.
fn to_atomic_units(amount: Decimal, decimals: u32) -> Result<U256, ChainError> {
    let scaled = amount.checked_mul(Decimal::from(10u64.pow(decimals)))
        .ok_or_else(|| network_error("amount overflow while scaling to atomic units"))?;
    let scaled = scaled.round();
    let as_u128 = scaled
        .to_u128()
        .ok_or_else(|| network_error("amount does not fit in atomic units"))?;
    Ok(U256::from(as_u128))
}

fn from_atomic_units(value: U256, decimals: u32) -> Decimal {
    let as_u128: u128 = value.try_into().unwrap_or(u128::MAX);
    Decimal::from(as_u128) / Decimal::from(10u64.pow(decimals))
}

/// Ethereum chain adapter.
///
/// Holds a read-only provider (used for balance/receipt/latest-block
/// queries, which never need a signer) and the contract address for every
/// configured ERC-20 token.
pub struct EvmAdapter {
    rpc_url: Url,
    chain_id: u64,
    token_addresses: HashMap<Token, Address>,
}

impl EvmAdapter {
    pub fn new(rpc_url: Url, chain_id: u64, token_addresses: HashMap<Token, Address>) -> Self {
        Self {
            rpc_url,
            chain_id,
            token_addresses,
        }
    }

    fn read_provider(&self) -> impl Provider + Clone {
        ProviderBuilder::new().connect_http(self.rpc_url.clone())
    }

    fn signer_provider(&self, private_key_hex: &str) -> Result<impl Provider, ChainError> {
        let signer = PrivateKeySigner::from_str(private_key_hex)
            .map_err(|e| ChainError::InvalidKey(format!("malformed EVM private key: {e}")))?;
        let wallet = EthereumWallet::from(signer);
        Ok(ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.rpc_url.clone()))
    }

    fn token_address(&self, token: Token) -> Result<Address, ChainError> {
        self.token_addresses
            .get(&token)
            .copied()
            .ok_or_else(|| ChainError::NotFound(format!("no contract address configured for {token}")))
    }

    /// Mints `amount` of a privileged test token to `to`, signed by the
    /// minter key. Only ever called for TEST-USDC/TEST-EURC by the test
    /// token funding path; the contracts are pre-deployed elsewhere.
    pub async fn mint(
        &self,
        minter_key_hex: &str,
        to: &str,
        amount: Decimal,
        token: Token,
    ) -> Result<String, ChainError> {
        let to_addr = Address::from_str(to)
            .map_err(|e| network_error(format!("invalid recipient {to}: {e}")))?;
        let provider = self.signer_provider(minter_key_hex)?;
        let atomic_amount = to_atomic_units(amount, token.decimals())?;
        let contract_address = self.token_address(token)?;
        let contract = IERC20::new(contract_address, &provider);
        let pending = contract
            .mint(to_addr, atomic_amount)
            .send()
            .await
            .map_err(|e| network_error(format!("mint call failed: {e}")))?;
        Ok(format!("{:#x}", pending.tx_hash()))
    }
}

#[async_trait]
impl ChainAdapter for EvmAdapter {
    fn network(&self) -> Network {
        Network::Ethereum
    }

    fn generate(&self) -> GeneratedKeypair {
        let signer = PrivateKeySigner::random();
        GeneratedKeypair {
            address: signer.address().to_string(),
            signing_material: hex::encode(signer.to_bytes()),
        }
    }

    async fn balance(&self, address: &str, token: Token) -> Result<Decimal, ChainError> {
        let addr = Address::from_str(address)
            .map_err(|e| network_error(format!("invalid address {address}: {e}")))?;
        let provider = self.read_provider();

        if token == Token::Eth {
            let wei = provider
                .get_balance(addr)
                .await
                .map_err(|e| network_error(e.to_string()))?;
            return Ok(from_atomic_units(wei, token.decimals()));
        }

        let contract_address = self.token_address(token)?;
        let contract = IERC20::new(contract_address, provider);
        let balance = contract
            .balanceOf(addr)
            .call()
            .await
            .map_err(|e| network_error(format!("balanceOf call failed: {e}")))?;
        Ok(from_atomic_units(balance, token.decimals()))
    }

    async fn transfer(
        &self,
        signing_material: &str,
        to: &str,
        amount: Decimal,
        token: Token,
    ) -> Result<String, ChainError> {
        let to_addr = Address::from_str(to)
            .map_err(|e| network_error(format!("invalid recipient {to}: {e}")))?;
        let signer = PrivateKeySigner::from_str(signing_material)
            .map_err(|e| ChainError::InvalidKey(format!("malformed EVM private key: {e}")))?;
        let from_address = signer.address();
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.rpc_url.clone());

        let remote_chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| network_error(format!("eth_chainId failed: {e}")))?;
        if remote_chain_id != self.chain_id {
            return Err(network_error(format!(
                "configured chain id {} does not match connected node's chain id {remote_chain_id}",
                self.chain_id
            )));
        }

        let balance = self.balance(&from_address.to_string(), token).await?;
        if balance < amount {
            return Err(ChainError::InsufficientBalance {
                available: balance.to_string(),
                required: amount.to_string(),
                asset: token,
            });
        }

        let atomic_amount = to_atomic_units(amount, token.decimals())?;

        let tx = if token == Token::Eth {
            TransactionRequest::default()
                .with_to(to_addr)
                .with_value(atomic_amount)
                .with_chain_id(self.chain_id)
        } else {
            let contract_address = self.token_address(token)?;
            let contract = IERC20::new(contract_address, &provider);
            contract
                .transfer(to_addr, atomic_amount)
                .into_transaction_request()
                .with_chain_id(self.chain_id)
        };

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| network_error(format!("eth_sendRawTransaction failed: {e}")))?;
        Ok(format!("{:#x}", pending.tx_hash()))
    }

    async fn receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, ChainError> {
        let hash = alloy_primitives::B256::from_str(tx_hash)
            .map_err(|e| network_error(format!("invalid tx hash {tx_hash}: {e}")))?;
        let provider = self.read_provider();
        let receipt = provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| network_error(e.to_string()))?;
        Ok(receipt.map(|r| Receipt {
            mined: true,
            ok: r.status(),
            block_number: r.block_number,
        }))
    }

    async fn latest_block(&self) -> Result<u64, ChainError> {
        self.read_provider()
            .get_block_number()
            .await
            .map_err(|e| network_error(e.to_string()))
    }
}

#[async_trait]
impl crate::chain::TokenMinter for EvmAdapter {
    async fn mint(
        &self,
        minter_key: &str,
        to: &str,
        amount: Decimal,
        token: Token,
    ) -> Result<String, ChainError> {
        EvmAdapter::mint(self, minter_key, to, amount, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_checksum_address_and_hex_key() {
        let adapter = EvmAdapter::new(
            Url::parse("http://localhost:8545").unwrap(),
            1,
            HashMap::new(),
        );
        let keypair = adapter.generate();
        assert!(keypair.address.starts_with("0x"));
        assert_eq!(keypair.address.len(), 42);
        assert_eq!(keypair.signing_material.len(), 64);
    }

    #[test]
    fn atomic_unit_round_trip() {
        let amount = Decimal::new(1050000, 6); // 1.05
        let atomic = to_atomic_units(amount, 6).unwrap();
        assert_eq!(atomic, U256::from(1_050_000u64));
        assert_eq!(from_atomic_units(atomic, 6), amount);
    }
}
