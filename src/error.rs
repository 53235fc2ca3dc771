//! Error kinds for every component boundary. Transfer-path errors are
//! surfaced to the caller; monitor-path errors are swallowed and logged so
//! one bad entry never stalls the sweep.

use thiserror::Error;

use crate::types::{Network, Token};

/// Rejections raised by the validation gate, before a transfer ever
/// reaches a chain adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("amount must be a positive decimal with scale <= 18")]
    InvalidAmount,
    #[error("recipient is missing or blank")]
    MissingRecipient,
    #[error("unsupported token symbol: {0}")]
    UnsupportedToken(String),
    #[error("recipient is not a valid EVM address: {0}")]
    InvalidEvmAddress(String),
}

/// Failures from the seed codec. Both variants are non-retryable; the
/// caller must regenerate or fix the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    #[error("seed is unusable and must be regenerated: {0}")]
    RegenerateWallet(String),
    #[error("seed string format is not recognized: {0}")]
    UnsupportedFormat(String),
}

/// Errors surfaced by a [`crate::chain::ChainAdapter`].
///
/// `Network` variants are transient and safe to retry; `Permanent` variants
/// (e.g. an unparseable key) must not be retried.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("network error talking to {network}: {message}")]
    Network { network: Network, message: String },
    #[error("timed out talking to {network}")]
    Timeout { network: Network },
    #[error("cannot sign with the provided key: {0}")]
    InvalidKey(String),
    #[error("insufficient balance: have {available}, need {required} {asset}")]
    InsufficientBalance {
        available: String,
        required: String,
        asset: Token,
    },
    #[error("not found: {0}")]
    NotFound(String),
}

impl ChainError {
    /// Whether this error is safe to retry (network-shaped) vs. permanent.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChainError::Network { .. } | ChainError::Timeout { .. })
    }
}

/// Errors from the transfer dispatcher, surfaced to the transfer caller.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("user {0} has no credentials for the requested chain")]
    MissingCredentials(u64),
    #[error("ledger rejected the submitted transfer: {0}")]
    Ledger(#[from] crate::ledger::LedgerError),
}

/// Errors from the user registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("no user found for id {0}")]
    NotFound(u64),
}

/// Configuration problems, surfaced at the moment the missing setting is needed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required configuration key missing: {0}")]
    Missing(String),
    #[error("invalid configuration value for {key}: {message}")]
    Invalid { key: String, message: String },
    #[error("environment variable '{0}' referenced by config was not found")]
    EnvVarMissing(String),
}

/// Errors surfaced across the five core-API verbs.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ledger(#[from] crate::ledger::LedgerError),
}
