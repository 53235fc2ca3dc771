//! Multi-chain custodial wallet backend: transfer orchestration and
//! monitoring across Ethereum, XRP Ledger and Solana.
//!
//! Three heterogeneous wire protocols — EVM JSON-RPC with ERC-20 ABI
//! calls, XRPL signed-transaction submission, Solana RPC with base58
//! keypairs — sit behind one [`chain::ChainAdapter`] trait, one
//! [`types::LedgerEntry`] status machine, and one [`monitor::Monitor`]
//! reconciliation loop. [`api::Api`] is the seam a front door (HTTP, CLI,
//! whatever) calls into.

pub mod api;
pub mod chain;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod funding;
pub mod ledger;
pub mod monitor;
pub mod registry;
pub mod seed;
pub mod sig_down;
pub mod telemetry;
pub mod types;
pub mod validation;
