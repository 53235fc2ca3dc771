//! Stub chain adapters shared across the end-to-end scenario tests.
//!
//! Each stub implements one of the three chain-facing traits with behavior
//! controlled by the test, so a scenario can force a specific receipt,
//! block height or faucet outcome without talking to a real network.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;

use multichain_custody::chain::{ChainAdapter, FaucetClient, GeneratedKeypair, Receipt, TokenMinter};
use multichain_custody::config::{Config, EvmConfig, LiteralOrEnv, MonitorConfig, SolConfig, XrpConfig};
use multichain_custody::error::ChainError;
use multichain_custody::types::{Network, Token};

/// Builds a [`Config`] suitable for wiring an [`multichain_custody::api::Api`]
/// in tests, with a hot-wallet key present or absent as requested.
pub fn test_config(funding_private_key: Option<&str>) -> Config {
    Config {
        evm: EvmConfig {
            rpc_url: "http://localhost:8545".parse().unwrap(),
            chain_id: 1337,
            funding_private_key: funding_private_key.map(|k| LiteralOrEnv(k.to_string())),
            funding_initial_eth: "10".to_string(),
            token_usdc_address: "0x0000000000000000000000000000000000000001".to_string(),
            token_eurc_address: "0x0000000000000000000000000000000000000002".to_string(),
            token_test_usdc_address: "0x0000000000000000000000000000000000000003".to_string(),
            token_test_eurc_address: "0x0000000000000000000000000000000000000004".to_string(),
        },
        xrp: XrpConfig {
            rpc_url: "http://localhost:5005".to_string(),
            faucet_url: "http://localhost:5006/accounts".parse().unwrap(),
            funding_secret: None,
            funding_initial_xrp: "100".to_string(),
        },
        sol: SolConfig {
            rpc_url: "http://localhost:8899".to_string(),
            funding_initial_sol: "1".to_string(),
        },
        monitor: MonitorConfig::default(),
    }
}

pub struct StubAdapter {
    network: Network,
    keypair: GeneratedKeypair,
    transfer_result: Mutex<Result<String, String>>,
    receipts: Mutex<HashMap<String, Receipt>>,
    latest_block: AtomicU64,
}

impl StubAdapter {
    pub fn new(network: Network, address: &str, signing_material: &str) -> Self {
        Self {
            network,
            keypair: GeneratedKeypair {
                address: address.to_string(),
                signing_material: signing_material.to_string(),
            },
            transfer_result: Mutex::new(Ok("0xstubhash".to_string())),
            receipts: Mutex::new(HashMap::new()),
            latest_block: AtomicU64::new(0),
        }
    }

    pub fn set_transfer_result(&self, result: Result<&str, &str>) {
        *self.transfer_result.lock().unwrap() =
            result.map(str::to_string).map_err(str::to_string);
    }

    pub fn set_receipt(&self, hash: &str, receipt: Receipt) {
        self.receipts.lock().unwrap().insert(hash.to_string(), receipt);
    }

    pub fn set_latest_block(&self, block: u64) {
        self.latest_block.store(block, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainAdapter for StubAdapter {
    fn network(&self) -> Network {
        self.network
    }

    fn generate(&self) -> GeneratedKeypair {
        self.keypair.clone()
    }

    async fn balance(&self, _address: &str, _token: Token) -> Result<Decimal, ChainError> {
        Ok(Decimal::ZERO)
    }

    async fn transfer(
        &self,
        _signing_material: &str,
        _to: &str,
        _amount: Decimal,
        _token: Token,
    ) -> Result<String, ChainError> {
        self.transfer_result
            .lock()
            .unwrap()
            .clone()
            .map_err(|message| ChainError::Network { network: self.network, message })
    }

    async fn receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, ChainError> {
        Ok(self.receipts.lock().unwrap().get(tx_hash).copied())
    }

    async fn latest_block(&self) -> Result<u64, ChainError> {
        Ok(self.latest_block.load(Ordering::SeqCst))
    }
}

pub struct StubFaucet {
    succeed: std::sync::atomic::AtomicBool,
}

impl StubFaucet {
    pub fn new(succeed: bool) -> Self {
        Self { succeed: std::sync::atomic::AtomicBool::new(succeed) }
    }
}

#[async_trait]
impl FaucetClient for StubFaucet {
    async fn request_funding(&self, _faucet_url: &url::Url, _address: &str) -> bool {
        self.succeed.load(Ordering::SeqCst)
    }
}

pub struct StubMinter {
    result: Mutex<Result<String, String>>,
}

impl StubMinter {
    pub fn new(result: Result<&str, &str>) -> Self {
        Self { result: Mutex::new(result.map(str::to_string).map_err(str::to_string)) }
    }
}

#[async_trait]
impl TokenMinter for StubMinter {
    async fn mint(
        &self,
        _minter_key: &str,
        _to: &str,
        _amount: Decimal,
        _token: Token,
    ) -> Result<String, ChainError> {
        self.result
            .lock()
            .unwrap()
            .clone()
            .map_err(|message| ChainError::Network { network: Network::Ethereum, message })
    }
}
