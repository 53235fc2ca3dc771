//! Transfer dispatcher: routes a validated transfer to the right chain
//! adapter and records the resulting PENDING ledger entry.
//!
//! A failed submission propagates the adapter's error and writes nothing —
//! symmetric with the ledger's "no hash ⇒ never PENDING" invariant. There
//! is no double-submit protection at this layer; it relies on the chain's
//! own nonce/sequence mechanics inside each adapter.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::chain::ChainAdapter;
use crate::error::DispatchError;
use crate::ledger::{LedgerStore, NewEntry};
use crate::registry::UserRegistry;
use crate::types::{EntryStatus, EntryType, LedgerEntry, Token, UserId};
use crate::validation;

/// The three chain adapters the dispatcher routes across.
pub struct Dispatcher {
    evm: Arc<dyn ChainAdapter>,
    xrp: Arc<dyn ChainAdapter>,
    solana: Arc<dyn ChainAdapter>,
}

impl Dispatcher {
    pub fn new(
        evm: Arc<dyn ChainAdapter>,
        xrp: Arc<dyn ChainAdapter>,
        solana: Arc<dyn ChainAdapter>,
    ) -> Self {
        Self { evm, xrp, solana }
    }

    /// Picks the adapter for `token`: SOL→Solana, XRP→XRP, everything
    /// else (ETH/USDC/EURC/TEST-USDC/TEST-EURC)→EVM.
    pub fn adapter_for(&self, token: Token) -> &Arc<dyn ChainAdapter> {
        match token {
            Token::Sol => &self.solana,
            Token::Xrp => &self.xrp,
            _ => &self.evm,
        }
    }

    /// Validates, dispatches, and records one user-initiated transfer.
    #[tracing::instrument(skip(self, registry, ledger), fields(user_id = user_id.0))]
    pub async fn dispatch(
        &self,
        registry: &UserRegistry,
        ledger: &LedgerStore,
        user_id: UserId,
        recipient: &str,
        amount: Decimal,
        token: &str,
    ) -> Result<LedgerEntry, DispatchError> {
        let token = validation::validate_transfer(recipient, amount, token)?;

        let user = registry
            .by_id(user_id)
            .ok_or(DispatchError::MissingCredentials(user_id.0))?;

        let signing_material = match token {
            Token::Sol => user
                .solana
                .as_ref()
                .map(|c| c.secret_key_b64.clone()),
            Token::Xrp => user.xrp.as_ref().map(|c| c.seed_hex.clone()),
            _ => user.evm.as_ref().map(|c| c.private_key_hex.clone()),
        }
        .ok_or(DispatchError::MissingCredentials(user_id.0))?;

        let adapter = self.adapter_for(token);
        let tx_hash = adapter
            .transfer(&signing_material, recipient, amount, token)
            .await?;

        let entry = ledger.append(NewEntry {
            user_id,
            recipient: recipient.to_string(),
            amount,
            token,
            network: token.network(),
            tx_hash: Some(tx_hash),
            status: EntryStatus::Pending,
            entry_type: EntryType::Transfer,
        })?;
        Ok(entry)
    }
}
