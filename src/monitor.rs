//! Monitor loop: a periodic job that drives every PENDING ledger entry to
//! a terminal status by polling the relevant chain adapter.
//!
//! Runs on a fixed tick; per-entry failures are swallowed and logged so one
//! bad entry never stalls the sweep. Shutdown is cooperative: the loop
//! finishes whichever entry it is on, then exits on the next tick boundary.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::chain::ChainAdapter;
use crate::config::MonitorConfig;
use crate::ledger::LedgerStore;
use crate::types::{EntryStatus, LedgerEntry, Network, now_epoch_ms};

pub struct Monitor {
    ledger: Arc<LedgerStore>,
    evm: Arc<dyn ChainAdapter>,
    xrp: Arc<dyn ChainAdapter>,
    solana: Arc<dyn ChainAdapter>,
    config: MonitorConfig,
}

impl Monitor {
    pub fn new(
        ledger: Arc<LedgerStore>,
        evm: Arc<dyn ChainAdapter>,
        xrp: Arc<dyn ChainAdapter>,
        solana: Arc<dyn ChainAdapter>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            ledger,
            evm,
            xrp,
            solana,
            config,
        }
    }

    fn adapter_for(&self, network: Network) -> &Arc<dyn ChainAdapter> {
        match network {
            Network::Ethereum => &self.evm,
            Network::Xrp => &self.xrp,
            Network::Solana => &self.solana,
        }
    }

    /// Runs the periodic sweep until `cancellation_token` fires. The first
    /// tick fires after `initial_delay_secs`; every subsequent tick after
    /// `period_secs`.
    pub async fn run(&self, cancellation_token: CancellationToken) {
        tokio::time::sleep(Duration::from_secs(self.config.initial_delay_secs)).await;
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.period_secs));

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    tracing::info!("monitor loop received shutdown signal, exiting");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// Runs a single sweep pass on demand, outside the periodic loop.
    /// Exposed so callers (and tests) can force a check without waiting on
    /// the configured interval.
    pub async fn tick_once(&self) {
        self.tick().await;
    }

    #[tracing::instrument(skip(self))]
    async fn tick(&self) {
        let pending = self.ledger.by_status(EntryStatus::Pending);
        if pending.is_empty() {
            return;
        }
        tracing::debug!(count = pending.len(), "sweeping pending entries");
        for entry in pending {
            if let Err(err) = self.process_entry(&entry).await {
                tracing::warn!(entry_id = entry.id.0, error = %err, "failed to resolve pending entry, leaving PENDING");
            }
        }
    }

    async fn process_entry(&self, entry: &LedgerEntry) -> Result<(), crate::error::ChainError> {
        let age_ms = now_epoch_ms().saturating_sub(entry.timestamp_ms);
        let max_age_ms = (self.config.max_age_hours as u128) * 3_600_000;
        if age_ms > max_age_ms {
            self.transition(entry, EntryStatus::Timeout);
            return Ok(());
        }

        if entry.has_synthetic_hash() {
            return Ok(());
        }

        let Some(tx_hash) = entry.tx_hash.as_deref() else {
            // Unreachable under I1, but leave PENDING rather than panic.
            return Ok(());
        };

        let adapter = self.adapter_for(entry.network);
        let receipt = adapter.receipt(tx_hash).await?;
        let Some(receipt) = receipt else {
            return Ok(()); // not found yet; still pending
        };

        if !receipt.ok {
            self.transition(entry, EntryStatus::Failed);
            return Ok(());
        }

        if entry.network == Network::Ethereum {
            let Some(receipt_block) = receipt.block_number else {
                return Ok(());
            };
            let latest = adapter.latest_block().await?;
            let confirmations = latest.saturating_sub(receipt_block) + 1;
            if confirmations < self.config.evm_confirmations {
                return Ok(()); // re-checked next tick
            }
        }

        self.transition(entry, EntryStatus::Confirmed);
        Ok(())
    }

    fn transition(&self, entry: &LedgerEntry, new_status: EntryStatus) {
        if let Err(err) = self.ledger.update_status(entry.id, new_status) {
            tracing::warn!(entry_id = entry.id.0, error = %err, "status transition rejected");
        }
    }
}
