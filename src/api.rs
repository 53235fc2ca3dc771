//! Core API: the five verbs an HTTP/UI layer would call into.
//!
//! Wires together the registry, ledger, dispatcher, funding recorder and
//! the three chain adapters. No HTTP is built here — that surface is out
//! of scope; this struct is the seam a future web layer would sit on.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Serialize;

use crate::chain::evm::EvmAdapter;
use crate::chain::solana::SolanaAdapter;
use crate::chain::xrpl::XrplAdapter;
use crate::chain::{ChainAdapter, FaucetClient, TokenMinter};
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::{ApiError, ConfigError};
use crate::funding;
use crate::ledger::LedgerStore;
use crate::registry::UserRegistry;
use crate::types::{EntryType, LedgerEntry, User, UserId};

/// Output shape of [`Api::list_transactions`].
#[derive(Debug, Clone, Serialize)]
pub struct TransactionsView {
    pub sent: Vec<LedgerEntry>,
    pub received: Vec<LedgerEntry>,
    pub all: Vec<LedgerEntry>,
    pub funding: Vec<LedgerEntry>,
}

/// Output shape of [`Api::fund_test_tokens`].
#[derive(Debug, Clone, Serialize)]
pub struct TestTokenFundingResult {
    pub usdc: Option<String>,
    pub eurc: Option<String>,
}

pub struct Api {
    registry: UserRegistry,
    ledger: Arc<LedgerStore>,
    dispatcher: Dispatcher,
    evm: Arc<dyn ChainAdapter>,
    xrp: Arc<dyn ChainAdapter>,
    solana: Arc<dyn ChainAdapter>,
    minter: Arc<dyn TokenMinter>,
    faucet: Arc<dyn FaucetClient>,
    config: Config,
}

impl Api {
    /// Production constructor: takes the concrete adapters directly, since
    /// `EvmAdapter`/`XrplAdapter` are the only types that implement both a
    /// [`ChainAdapter`] and their chain-specific seam trait.
    pub fn new(
        evm: Arc<EvmAdapter>,
        xrp: Arc<XrplAdapter>,
        solana: Arc<SolanaAdapter>,
        config: Config,
    ) -> Self {
        Self::with_adapters(
            evm.clone() as Arc<dyn ChainAdapter>,
            xrp.clone() as Arc<dyn ChainAdapter>,
            solana as Arc<dyn ChainAdapter>,
            evm as Arc<dyn TokenMinter>,
            xrp as Arc<dyn FaucetClient>,
            config,
        )
    }

    /// Core constructor over the trait-object seams, so tests can substitute
    /// stub adapters without a live chain connection.
    pub fn with_adapters(
        evm: Arc<dyn ChainAdapter>,
        xrp: Arc<dyn ChainAdapter>,
        solana: Arc<dyn ChainAdapter>,
        minter: Arc<dyn TokenMinter>,
        faucet: Arc<dyn FaucetClient>,
        config: Config,
    ) -> Self {
        let ledger = Arc::new(LedgerStore::new());
        let dispatcher = Dispatcher::new(evm.clone(), xrp.clone(), solana.clone());
        Self {
            registry: UserRegistry::new(),
            ledger,
            dispatcher,
            evm,
            xrp,
            solana,
            minter,
            faucet,
            config,
        }
    }

    /// Shared handle to the ledger, for wiring the monitor loop in `main`.
    pub fn ledger(&self) -> Arc<LedgerStore> {
        self.ledger.clone()
    }

    pub fn evm_adapter(&self) -> Arc<dyn ChainAdapter> {
        self.evm.clone()
    }

    pub fn xrp_adapter(&self) -> Arc<dyn ChainAdapter> {
        self.xrp.clone()
    }

    pub fn solana_adapter(&self) -> Arc<dyn ChainAdapter> {
        self.solana.clone()
    }

    /// Mints credential triples for `username` on all three chains, then
    /// funds ETH (if a hot wallet key is configured) and XRP (via faucet).
    /// No Solana funding at creation, by design.
    #[tracing::instrument(skip(self))]
    pub async fn create_user_with_wallets_and_funding(
        &self,
        username: &str,
    ) -> Result<User, ApiError> {
        let evm_kp = self.evm.generate();
        let xrp_kp = self.xrp.generate();
        let sol_kp = self.solana.generate();

        let user = self.registry.create(username, evm_kp, xrp_kp, sol_kp)?;

        if let (Some(evm_creds), Some(funding_key)) =
            (&user.evm, self.config.evm.funding_private_key.as_ref())
        {
            let amount = parse_amount(&self.config.evm.funding_initial_eth)?;
            if let Err(err) = funding::fund_eth(
                &self.ledger,
                &self.evm,
                funding_key.as_str(),
                user.id,
                &evm_creds.address,
                amount,
            )
            .await
            {
                tracing::warn!(user = %username, error = %err, "failed to record ETH funding entry");
            }
        }

        if let Some(xrp_creds) = &user.xrp {
            let amount = parse_amount(&self.config.xrp.funding_initial_xrp)?;
            if let Err(err) = funding::fund_xrp_faucet(
                &self.ledger,
                &self.faucet,
                &self.config.xrp.faucet_url,
                user.id,
                &xrp_creds.address,
                amount,
            )
            .await
            {
                tracing::warn!(user = %username, error = %err, "failed to record XRP faucet funding entry");
            }
        }

        Ok(user)
    }

    /// Validates and dispatches a transfer, returning the PENDING entry.
    pub async fn initiate_transfer(
        &self,
        user_id: UserId,
        recipient: &str,
        amount: Decimal,
        token: &str,
    ) -> Result<LedgerEntry, ApiError> {
        self.dispatcher
            .dispatch(&self.registry, &self.ledger, user_id, recipient, amount, token)
            .await
            .map_err(ApiError::from)
    }

    /// Sent (TRANSFER entries initiated by `user_id`), received (any entry
    /// whose recipient is one of the user's three addresses), their
    /// timestamp-desc union, and the user's funding-type entries.
    pub fn list_transactions(&self, user_id: UserId) -> Result<TransactionsView, ApiError> {
        let user = self
            .registry
            .by_id(user_id)
            .ok_or(crate::error::RegistryError::NotFound(user_id.0))?;

        let sent = self
            .ledger
            .by_user_id_and_type_in(user_id, &[EntryType::Transfer]);

        let mut received = Vec::new();
        for address in [
            user.evm.as_ref().map(|c| c.address.clone()),
            user.xrp.as_ref().map(|c| c.address.clone()),
            user.solana.as_ref().map(|c| c.public_key.clone()),
        ]
        .into_iter()
        .flatten()
        {
            received.extend(self.ledger.by_recipient(&address));
        }

        let funding = self.ledger.by_user_id_and_type_in(
            user_id,
            &[
                EntryType::Funding,
                EntryType::Minting,
                EntryType::FaucetFunding,
                EntryType::ExternalFunding,
            ],
        );

        let mut seen = HashSet::new();
        let mut all: Vec<LedgerEntry> = sent
            .iter()
            .chain(received.iter())
            .filter(|e| seen.insert(e.id))
            .cloned()
            .collect();
        all.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));

        Ok(TransactionsView {
            sent,
            received,
            all,
            funding,
        })
    }

    /// Replaces the user's XRP credential triple and funds the new address
    /// via the faucet (regeneration's funding is the caller's
    /// responsibility; this API performs it for convenience).
    pub async fn regenerate_xrp_wallet(&self, user_id: UserId) -> Result<User, ApiError> {
        let xrp_kp = self.xrp.generate();
        let address = xrp_kp.address.clone();
        let user = self.registry.regenerate_xrp(user_id, xrp_kp)?;

        let amount = parse_amount(&self.config.xrp.funding_initial_xrp)?;
        if let Err(err) = funding::fund_xrp_faucet(
            &self.ledger,
            &self.faucet,
            &self.config.xrp.faucet_url,
            user_id,
            &address,
            amount,
        )
        .await
        {
            tracing::warn!(user_id = user_id.0, error = %err, "failed to record XRP faucet funding entry after regeneration");
        }

        Ok(user)
    }

    /// Mints TEST-USDC and TEST-EURC to the user's EVM address. Requires
    /// the same hot-wallet key used for ETH funding to double as the
    /// minter; absent, this is a `ConfigurationError`.
    pub async fn fund_test_tokens(&self, user_id: UserId) -> Result<TestTokenFundingResult, ApiError> {
        let user = self
            .registry
            .by_id(user_id)
            .ok_or(crate::error::RegistryError::NotFound(user_id.0))?;
        let evm_creds = user
            .evm
            .as_ref()
            .ok_or_else(|| ConfigError::Missing("user has no EVM address".to_string()))?;
        let minter_key = self
            .config
            .evm
            .funding_private_key
            .as_ref()
            .ok_or_else(|| ConfigError::Missing("evm.funding.privateKey (required to mint test tokens)".to_string()))?;

        let amount = Decimal::from_i32(100).unwrap_or(Decimal::ONE);
        let (usdc, eurc) = funding::mint_test_tokens(
            &self.ledger,
            &self.minter,
            minter_key.as_str(),
            user_id,
            &evm_creds.address,
            amount,
        )
        .await?;

        Ok(TestTokenFundingResult { usdc, eurc })
    }
}

fn parse_amount(s: &str) -> Result<Decimal, ConfigError> {
    s.parse().map_err(|e| ConfigError::Invalid {
        key: "funding amount".to_string(),
        message: format!("{e}"),
    })
}
