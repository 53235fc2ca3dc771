//! Core domain types: users, ledger entries, networks, tokens and statuses.
//!
//! These mirror the unified transaction model that lets three unrelated
//! ledgers (Ethereum, XRP Ledger, Solana) live behind one status machine.

use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Monotonic user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic ledger entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the three ledgers this engine custodies addresses on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Network {
    Ethereum,
    Xrp,
    Solana,
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Network::Ethereum => "ETHEREUM",
            Network::Xrp => "XRP",
            Network::Solana => "SOLANA",
        };
        write!(f, "{s}")
    }
}

/// A token symbol recognized anywhere in the system.
///
/// Each token trades on exactly one network, given by [`Token::network`];
/// the ledger store and validation gate both enforce that pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    Eth,
    Usdc,
    Eurc,
    TestUsdc,
    TestEurc,
    Xrp,
    Sol,
}

impl Token {
    /// Decimal scale used by this token's smallest on-chain unit.
    pub fn decimals(&self) -> u32 {
        match self {
            Token::Eth | Token::Eurc | Token::TestEurc => 18,
            Token::Usdc | Token::TestUsdc => 6,
            Token::Xrp => 6,
            Token::Sol => 9,
        }
    }

    /// The single network this token can be moved on.
    pub fn network(&self) -> Network {
        match self {
            Token::Eth | Token::Usdc | Token::Eurc | Token::TestUsdc | Token::TestEurc => {
                Network::Ethereum
            }
            Token::Xrp => Network::Xrp,
            Token::Sol => Network::Solana,
        }
    }

    /// Whether this token is an EVM-family asset (native ETH or an ERC-20).
    pub fn is_evm(&self) -> bool {
        self.network() == Network::Ethereum
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Token::Eth => "ETH",
            Token::Usdc => "USDC",
            Token::Eurc => "EURC",
            Token::TestUsdc => "TEST-USDC",
            Token::TestEurc => "TEST-EURC",
            Token::Xrp => "XRP",
            Token::Sol => "SOL",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownToken;

impl Display for UnknownToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized token symbol")
    }
}

impl std::error::Error for UnknownToken {}

impl FromStr for Token {
    type Err = UnknownToken;

    /// Parses case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ETH" => Ok(Token::Eth),
            "USDC" => Ok(Token::Usdc),
            "EURC" => Ok(Token::Eurc),
            "TEST-USDC" => Ok(Token::TestUsdc),
            "TEST-EURC" => Ok(Token::TestEurc),
            "XRP" => Ok(Token::Xrp),
            "SOL" => Ok(Token::Sol),
            _ => Err(UnknownToken),
        }
    }
}

/// Status of a [`LedgerEntry`]. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    Pending,
    Confirmed,
    Failed,
    Timeout,
    Dropped,
}

impl EntryStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EntryStatus::Pending)
    }
}

impl Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryStatus::Pending => "PENDING",
            EntryStatus::Confirmed => "CONFIRMED",
            EntryStatus::Failed => "FAILED",
            EntryStatus::Timeout => "TIMEOUT",
            EntryStatus::Dropped => "DROPPED",
        };
        write!(f, "{s}")
    }
}

/// What caused a ledger entry to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Transfer,
    Funding,
    Minting,
    FaucetFunding,
    ExternalFunding,
}

impl Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryType::Transfer => "TRANSFER",
            EntryType::Funding => "FUNDING",
            EntryType::Minting => "MINTING",
            EntryType::FaucetFunding => "FAUCET_FUNDING",
            EntryType::ExternalFunding => "EXTERNAL_FUNDING",
        };
        write!(f, "{s}")
    }
}

/// Prefix of the synthetic tracking identifier stored when a funding source
/// (the XRP faucet) gives no real transaction hash.
pub const SYNTHETIC_FAUCET_PREFIX: &str = "XRP_FAUCET_";

/// Builds a synthetic faucet tracking id: `XRP_FAUCET_<addr_prefix>_<epoch_ms>`.
pub fn synthetic_faucet_hash(address: &str, epoch_ms: u128) -> String {
    let addr_prefix: String = address.chars().take(8).collect();
    format!("{SYNTHETIC_FAUCET_PREFIX}{addr_prefix}_{epoch_ms}")
}

/// Unix epoch milliseconds, used for entry timestamps and synthetic hashes.
pub fn now_epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_millis()
}

/// The unified transaction record: every value movement, user- or
/// system-initiated, is one row of this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub recipient: String,
    pub amount: Decimal,
    pub token: Token,
    pub network: Network,
    pub tx_hash: Option<String>,
    pub status: EntryStatus,
    pub entry_type: EntryType,
    pub timestamp_ms: u128,
}

impl LedgerEntry {
    /// An entry cannot be `PENDING` with no hash.
    pub fn respects_hash_invariant(&self) -> bool {
        if self.status == EntryStatus::Pending {
            self.tx_hash.as_deref().is_some_and(|h| !h.is_empty())
        } else {
            true
        }
    }

    /// Whether `tx_hash` is the synthetic faucet marker the monitor must skip.
    pub fn has_synthetic_hash(&self) -> bool {
        self.tx_hash
            .as_deref()
            .is_some_and(|h| h.starts_with(SYNTHETIC_FAUCET_PREFIX))
    }
}

/// The three credential triples a [`User`] owns, one per chain.
#[derive(Debug, Clone)]
pub struct EvmCredentials {
    pub address: String,
    pub private_key_hex: String,
}

#[derive(Debug, Clone)]
pub struct XrpCredentials {
    pub address: String,
    pub seed_hex: String,
}

#[derive(Debug, Clone)]
pub struct SolanaCredentials {
    pub public_key: String,
    pub secret_key_b64: String,
}

/// A registered user with credential triples on all three chains.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub evm: Option<EvmCredentials>,
    pub xrp: Option<XrpCredentials>,
    pub solana: Option<SolanaCredentials>,
}
