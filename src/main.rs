//! Multi-chain custodial wallet backend entrypoint.
//!
//! Loads configuration, builds the three chain adapters, wires the core
//! API together, and runs the monitor loop until a shutdown signal
//! arrives. No HTTP server is started here — the core API in [`api::Api`]
//! is the integration seam a front door would call into.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;

use multichain_custody::api::Api;
use multichain_custody::chain::evm::EvmAdapter;
use multichain_custody::chain::solana::SolanaAdapter;
use multichain_custody::chain::xrpl::XrplAdapter;
use multichain_custody::config::{self, Config};
use multichain_custody::monitor::Monitor;
use multichain_custody::sig_down::SigDown;
use multichain_custody::telemetry;
use multichain_custody::types::Token;

fn token_addresses(config: &config::EvmConfig) -> Result<HashMap<Token, Address>, Box<dyn std::error::Error>> {
    let mut map = HashMap::new();
    map.insert(Token::Usdc, config.token_usdc_address.parse::<Address>()?);
    map.insert(Token::Eurc, config.token_eurc_address.parse::<Address>()?);
    map.insert(Token::TestUsdc, config.token_test_usdc_address.parse::<Address>()?);
    map.insert(Token::TestEurc, config.token_test_eurc_address.parse::<Address>()?);
    Ok(map)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();

    let config = Config::load_from_cli()?;

    let evm = Arc::new(EvmAdapter::new(
        config.evm.rpc_url.clone(),
        config.evm.chain_id,
        token_addresses(&config.evm)?,
    ));
    let xrp = Arc::new(XrplAdapter::new(config.xrp.rpc_url.clone()));
    let solana = Arc::new(SolanaAdapter::new(config.sol.rpc_url.clone()));

    let monitor_config = config.monitor.clone();
    let api = Api::new(evm.clone(), xrp.clone(), solana.clone(), config);
    let ledger = api.ledger();

    let sig_down = SigDown::try_new()?;
    let monitor = Monitor::new(
        ledger,
        api.evm_adapter(),
        api.xrp_adapter(),
        api.solana_adapter(),
        monitor_config,
    );
    let monitor_cancellation = sig_down.cancellation_token();
    let monitor_handle = tokio::spawn(async move {
        monitor.run(monitor_cancellation).await;
    });

    tracing::info!("multichain custody engine running; awaiting shutdown signal");
    sig_down.recv().await;
    monitor_handle.await?;

    Ok(())
}
