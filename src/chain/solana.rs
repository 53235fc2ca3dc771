//! Solana chain adapter: SOL transfers and balance/status queries over the
//! JSON-RPC client, signed locally with an ed25519 keypair.
//!
//! Simpler than the EVM adapter — Solana has no analogue of "latest block
//! confirmations", so [`ChainAdapter::latest_block`] keeps its default
//! not-applicable error.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_keypair::Keypair;
use solana_message::Message;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::Transaction;

use crate::chain::{ChainAdapter, GeneratedKeypair, Receipt};
use crate::error::ChainError;
use crate::types::{Network, Token};

const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Delay after an airdrop request before the balance is expected to reflect
/// it; devnet/testnet faucets process airdrops asynchronously.
const AIRDROP_SETTLE_DELAY: Duration = Duration::from_secs(2);

fn network_error(message: impl Into<String>) -> ChainError {
    ChainError::Network {
        network: Network::Solana,
        message: message.into(),
    }
}

fn to_lamports(amount: Decimal) -> Result<u64, ChainError> {
    let scaled = (amount * Decimal::from(LAMPORTS_PER_SOL)).round();
    scaled
        .to_u64()
        .ok_or_else(|| network_error("amount does not fit in lamports"))
}

fn from_lamports(lamports: u64) -> Decimal {
    Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL)
}

/// Solana chain adapter.
pub struct SolanaAdapter {
    rpc_url: String,
}

impl SolanaAdapter {
    pub fn new(rpc_url: String) -> Self {
        Self { rpc_url }
    }

    fn client(&self) -> RpcClient {
        RpcClient::new(self.rpc_url.clone())
    }

    /// Requests a devnet/testnet airdrop and waits for it to settle.
    pub async fn airdrop(&self, address: &str, amount: Decimal) -> Result<String, ChainError> {
        let pubkey = Pubkey::from_str(address)
            .map_err(|e| network_error(format!("invalid address {address}: {e}")))?;
        let lamports = to_lamports(amount)?;
        let client = self.client();
        let signature = client
            .request_airdrop(&pubkey, lamports)
            .await
            .map_err(|e| network_error(format!("requestAirdrop failed: {e}")))?;
        tokio::time::sleep(AIRDROP_SETTLE_DELAY).await;
        Ok(signature.to_string())
    }
}

#[async_trait]
impl ChainAdapter for SolanaAdapter {
    fn network(&self) -> Network {
        Network::Solana
    }

    fn generate(&self) -> GeneratedKeypair {
        let keypair = Keypair::new();
        GeneratedKeypair {
            address: keypair.pubkey().to_string(),
            signing_material: base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                keypair.to_bytes(),
            ),
        }
    }

    async fn balance(&self, address: &str, token: Token) -> Result<Decimal, ChainError> {
        if token != Token::Sol {
            return Err(network_error(format!("unsupported Solana token {token}")));
        }
        let pubkey = Pubkey::from_str(address)
            .map_err(|e| network_error(format!("invalid address {address}: {e}")))?;
        let lamports = self
            .client()
            .get_balance(&pubkey)
            .await
            .map_err(|e| network_error(format!("getBalance failed: {e}")))?;
        Ok(from_lamports(lamports))
    }

    async fn transfer(
        &self,
        signing_material: &str,
        to: &str,
        amount: Decimal,
        token: Token,
    ) -> Result<String, ChainError> {
        if token != Token::Sol {
            return Err(network_error(format!("unsupported Solana token {token}")));
        }
        let secret_bytes = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            signing_material,
        )
        .map_err(|e| ChainError::InvalidKey(format!("malformed base64 Solana key: {e}")))?;
        let keypair = Keypair::try_from(secret_bytes.as_slice())
            .map_err(|e| ChainError::InvalidKey(format!("malformed Solana keypair: {e}")))?;
        let to_pubkey = Pubkey::from_str(to)
            .map_err(|e| network_error(format!("invalid recipient {to}: {e}")))?;
        let lamports = to_lamports(amount)?;

        let client = self.client();
        let blockhash = client
            .get_latest_blockhash()
            .await
            .map_err(|e| network_error(format!("getLatestBlockhash failed: {e}")))?;

        let instruction =
            solana_system_interface::instruction::transfer(&keypair.pubkey(), &to_pubkey, lamports);
        let message = Message::new(&[instruction], Some(&keypair.pubkey()));
        let transaction = Transaction::new(&[&keypair], message, blockhash);

        let signature = client
            .send_transaction(&transaction)
            .await
            .map_err(|e| network_error(format!("sendTransaction failed: {e}")))?;
        Ok(signature.to_string())
    }

    async fn receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, ChainError> {
        let signature = Signature::from_str(tx_hash)
            .map_err(|e| network_error(format!("invalid signature {tx_hash}: {e}")))?;
        let statuses = self
            .client()
            .get_signature_statuses(&[signature])
            .await
            .map_err(|e| network_error(format!("getSignatureStatuses failed: {e}")))?;
        let Some(status) = statuses.value.into_iter().next().flatten() else {
            return Ok(None);
        };
        Ok(Some(Receipt {
            mined: true,
            ok: status.err.is_none(),
            block_number: Some(status.slot),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_base58_pubkey_and_base64_secret() {
        let adapter = SolanaAdapter::new("http://localhost:8899".to_string());
        let keypair = adapter.generate();
        assert!(bs58::decode(&keypair.address).into_vec().is_ok());
        assert!(
            base64::Engine::decode(
                &base64::engine::general_purpose::STANDARD,
                &keypair.signing_material
            )
            .is_ok()
        );
    }

    #[test]
    fn lamport_round_trip() {
        let amount = Decimal::new(250_000_000, 9); // 0.25 SOL
        let lamports = to_lamports(amount).unwrap();
        assert_eq!(lamports, 250_000_000);
        assert_eq!(from_lamports(lamports), amount);
    }
}
