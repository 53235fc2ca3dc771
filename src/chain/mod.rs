//! Chain adapters: one trait, three wire protocols.
//!
//! Every adapter — EVM JSON-RPC, XRPL signed-transaction submission, Solana
//! RPC — exposes the same five operations so the dispatcher and monitor
//! loop never need to know which chain they are talking to.

pub mod evm;
pub mod solana;
pub mod xrpl;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::ChainError;
use crate::types::{Network, Token};

/// A freshly generated keypair: an on-chain address and the private
/// material needed to sign with it, both already in their persisted string
/// encodings (hex for EVM/XRP seed, base58/base64 for Solana/XRP address).
#[derive(Debug, Clone)]
pub struct GeneratedKeypair {
    pub address: String,
    pub signing_material: String,
}

/// Outcome of polling a submitted transaction's receipt.
///
/// `None` from [`ChainAdapter::receipt`] means "not found yet" — not an
/// error, just still-pending.
#[derive(Debug, Clone, Copy)]
pub struct Receipt {
    pub mined: bool,
    pub ok: bool,
    pub block_number: Option<u64>,
}

/// The shared interface every chain adapter implements.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    fn network(&self) -> Network;

    /// Generates a fresh keypair for this chain. Pure CSPRNG use, no RPC.
    fn generate(&self) -> GeneratedKeypair;

    /// Queries `address`'s balance of `token`, in human units (not atomic).
    async fn balance(&self, address: &str, token: Token) -> Result<Decimal, ChainError>;

    /// Submits a transfer signed by `signing_material`, returning the
    /// chain-native transaction hash/id. Errors from signing are permanent;
    /// network errors are transient and safe to retry.
    async fn transfer(
        &self,
        signing_material: &str,
        to: &str,
        amount: Decimal,
        token: Token,
    ) -> Result<String, ChainError>;

    /// Fetches the current status of a previously submitted transaction.
    /// `Ok(None)` means "not found yet" — treated as still pending by the
    /// monitor loop, never as an error.
    async fn receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, ChainError>;

    /// The chain's current block height. Only meaningful (and only called)
    /// for the Ethereum adapter, to compute confirmation depth.
    async fn latest_block(&self) -> Result<u64, ChainError> {
        Err(ChainError::NotFound(
            "latest_block is not applicable to this chain".to_string(),
        ))
    }
}

/// A privileged ERC-20 `mint` call, separate from [`ChainAdapter`] because
/// only EVM test-token contracts expose it. Pulled out as its own trait (as
/// opposed to a concrete `EvmAdapter` dependency) so the funding path can
/// be exercised against a stub in tests.
#[async_trait]
pub trait TokenMinter: Send + Sync {
    async fn mint(
        &self,
        minter_key: &str,
        to: &str,
        amount: Decimal,
        token: Token,
    ) -> Result<String, ChainError>;
}

/// A testnet faucet HTTP endpoint that funds an address with no trustworthy
/// transaction hash in its response. Abstracted the same way as
/// [`TokenMinter`], so the funding path's success/failure handling is
/// testable without a real faucet.
#[async_trait]
pub trait FaucetClient: Send + Sync {
    async fn request_funding(&self, faucet_url: &url::Url, address: &str) -> bool;
}
