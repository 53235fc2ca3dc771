//! Funding recorder: records system-initiated credits (ETH drip, test-token
//! mint, XRP faucet) with the correct entry type.
//!
//! Funding is deliberately never PENDING: either the adapter returned a
//! hash (recorded CONFIRMED) or it didn't (recorded FAILED). The monitor
//! loop never revisits these entries.

use std::sync::Arc;

use rust_decimal::Decimal;
use url::Url;

use crate::chain::{ChainAdapter, FaucetClient, TokenMinter};
use crate::ledger::{LedgerError, LedgerStore, NewEntry};
use crate::types::{EntryStatus, EntryType, LedgerEntry, Network, Token, UserId, now_epoch_ms, synthetic_faucet_hash};

/// Writes one funding-type ledger entry. `CONFIRMED` if `tx_hash` is
/// present and non-empty, else `FAILED` — never `PENDING`.
pub fn record_funding(
    ledger: &LedgerStore,
    user_id: UserId,
    recipient: &str,
    amount: Decimal,
    token: Token,
    network: Network,
    tx_hash: Option<String>,
    entry_type: EntryType,
) -> Result<LedgerEntry, LedgerError> {
    let status = match tx_hash.as_deref() {
        Some(hash) if !hash.is_empty() => EntryStatus::Confirmed,
        _ => EntryStatus::Failed,
    };
    ledger.append(NewEntry {
        user_id,
        recipient: recipient.to_string(),
        amount,
        token,
        network,
        tx_hash,
        status,
        entry_type,
    })
}

/// Drips native ETH from the configured hot wallet to a newly created
/// user's address. Absent `funding_private_key` means ETH funding is
/// skipped entirely — not recorded as a failure, just not attempted.
pub async fn fund_eth(
    ledger: &LedgerStore,
    evm: &Arc<dyn ChainAdapter>,
    funding_private_key: &str,
    user_id: UserId,
    recipient: &str,
    amount: Decimal,
) -> Result<Option<LedgerEntry>, LedgerError> {
    let tx_hash = evm
        .transfer(funding_private_key, recipient, amount, Token::Eth)
        .await
        .ok();
    let entry = record_funding(
        ledger,
        user_id,
        recipient,
        amount,
        Token::Eth,
        Network::Ethereum,
        tx_hash,
        EntryType::Funding,
    )?;
    Ok(Some(entry))
}

/// Requests XRP testnet faucet funding. The faucet gives no real
/// transaction hash, so a synthetic `XRP_FAUCET_<addr_prefix>_<epoch_ms>`
/// identifier is recorded on success; on failure the entry is recorded
/// FAILED with no hash, never raised as an exception to the caller.
pub async fn fund_xrp_faucet(
    ledger: &LedgerStore,
    xrp: &Arc<dyn FaucetClient>,
    faucet_url: &Url,
    user_id: UserId,
    recipient: &str,
    amount: Decimal,
) -> Result<LedgerEntry, LedgerError> {
    let succeeded = xrp.request_funding(faucet_url, recipient).await;
    let tx_hash = succeeded.then(|| synthetic_faucet_hash(recipient, now_epoch_ms()));
    record_funding(
        ledger,
        user_id,
        recipient,
        amount,
        Token::Xrp,
        Network::Xrp,
        tx_hash,
        EntryType::FaucetFunding,
    )
}

/// Mints TEST-USDC and TEST-EURC to a user's EVM address via the
/// privileged minter key. Returns both transaction hashes on success;
/// each mint is recorded independently so one can fail without losing
/// the other.
pub async fn mint_test_tokens(
    ledger: &LedgerStore,
    evm: &Arc<dyn TokenMinter>,
    minter_private_key: &str,
    user_id: UserId,
    recipient: &str,
    amount: Decimal,
) -> Result<(Option<String>, Option<String>), LedgerError> {
    let usdc_hash = evm
        .mint(minter_private_key, recipient, amount, Token::TestUsdc)
        .await
        .ok();
    record_funding(
        ledger,
        user_id,
        recipient,
        amount,
        Token::TestUsdc,
        Network::Ethereum,
        usdc_hash.clone(),
        EntryType::Minting,
    )?;

    let eurc_hash = evm
        .mint(minter_private_key, recipient, amount, Token::TestEurc)
        .await
        .ok();
    record_funding(
        ledger,
        user_id,
        recipient,
        amount,
        Token::TestEurc,
        Network::Ethereum,
        eurc_hash.clone(),
        EntryType::Minting,
    )?;

    Ok((usdc_hash, eurc_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    #[test]
    fn record_funding_is_confirmed_with_hash_and_failed_without() {
        let ledger = LedgerStore::new();
        let confirmed = record_funding(
            &ledger,
            UserId(1),
            "rAddr",
            Decimal::ONE,
            Token::Xrp,
            Network::Xrp,
            Some("XRP_FAUCET_rAddr_123".to_string()),
            EntryType::FaucetFunding,
        )
        .unwrap();
        assert_eq!(confirmed.status, EntryStatus::Confirmed);

        let failed = record_funding(
            &ledger,
            UserId(1),
            "rAddr",
            Decimal::ONE,
            Token::Xrp,
            Network::Xrp,
            None,
            EntryType::FaucetFunding,
        )
        .unwrap();
        assert_eq!(failed.status, EntryStatus::Failed);
        assert!(failed.tx_hash.is_none());
    }
}
