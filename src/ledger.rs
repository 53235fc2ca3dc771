//! Ledger store: the unified, append-mostly transaction log.
//!
//! Modeled on the `DashMap`-backed caches the teacher crate uses for
//! per-address nonce state (`PendingNonceManager`) and provider lookup
//! (`ProviderCache`) — lock-free, row-local concurrency instead of one
//! coarse mutex guarding the whole table.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{
    EntryId, EntryStatus, EntryType, LedgerEntry, Network, Token, UserId, now_epoch_ms,
};

/// Everything needed to append a new row, before an id/timestamp is assigned.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub user_id: UserId,
    pub recipient: String,
    pub amount: Decimal,
    pub token: Token,
    pub network: Network,
    pub tx_hash: Option<String>,
    pub status: EntryStatus,
    pub entry_type: EntryType,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("entry with id {0} not found")]
    NotFound(u64),
    #[error("(network, token) pair {network}/{token} is not in the allowed matrix")]
    DisallowedPair { network: Network, token: Token },
    #[error("amount must be positive with scale <= 18")]
    InvalidAmount,
    #[error("a PENDING entry must have a non-empty tx_hash")]
    PendingRequiresHash,
    #[error("updateStatus called on entry {0} which is already in a terminal state")]
    AlreadyTerminal(u64),
    #[error("a transaction hash must be unique; {0} is already recorded")]
    DuplicateHash(String),
}

/// In-memory, multi-reader multi-writer ledger with secondary indexes on
/// `(status)`, `(userId, timestamp DESC)`, `(recipient, timestamp DESC)`,
/// `(userId, type, timestamp DESC)`, and a unique index on non-null
/// `txHash`.
#[derive(Default)]
pub struct LedgerStore {
    entries: DashMap<EntryId, LedgerEntry>,
    by_status: DashMap<EntryStatus, Vec<EntryId>>,
    by_user: DashMap<UserId, Vec<EntryId>>,
    by_recipient: DashMap<String, Vec<EntryId>>,
    by_hash: DashMap<String, EntryId>,
    next_id: AtomicU64,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new entry, assigning its id and creation timestamp.
    ///
    /// Rejects a `PENDING` entry with no hash and rejects any `(network,
    /// token)` pair outside the allowed matrix, before the row is visible
    /// to any reader.
    pub fn append(&self, new_entry: NewEntry) -> Result<LedgerEntry, LedgerError> {
        if new_entry.amount <= Decimal::ZERO || new_entry.amount.scale() > 18 {
            return Err(LedgerError::InvalidAmount);
        }
        if new_entry.token.network() != new_entry.network {
            return Err(LedgerError::DisallowedPair {
                network: new_entry.network,
                token: new_entry.token,
            });
        }
        if new_entry.status == EntryStatus::Pending
            && new_entry.tx_hash.as_deref().is_none_or(str::is_empty)
        {
            return Err(LedgerError::PendingRequiresHash);
        }
        if let Some(hash) = new_entry.tx_hash.as_deref().filter(|h| !h.is_empty()) {
            if self.by_hash.contains_key(hash) {
                return Err(LedgerError::DuplicateHash(hash.to_string()));
            }
        }

        let id = EntryId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let entry = LedgerEntry {
            id,
            user_id: new_entry.user_id,
            recipient: new_entry.recipient.clone(),
            amount: new_entry.amount,
            token: new_entry.token,
            network: new_entry.network,
            tx_hash: new_entry.tx_hash.clone(),
            status: new_entry.status,
            entry_type: new_entry.entry_type,
            timestamp_ms: now_epoch_ms(),
        };

        self.by_status.entry(entry.status).or_default().push(id);
        self.by_user.entry(entry.user_id).or_default().push(id);
        self.by_recipient
            .entry(entry.recipient.clone())
            .or_default()
            .push(id);
        if let Some(hash) = entry.tx_hash.as_deref().filter(|h| !h.is_empty()) {
            self.by_hash.insert(hash.to_string(), id);
        }
        self.entries.insert(id, entry.clone());
        Ok(entry)
    }

    /// Transitions a PENDING entry's status. Idempotent if `new_status`
    /// equals the stored status; rejects any other call on a non-PENDING
    /// entry (status regression).
    pub fn update_status(
        &self,
        id: EntryId,
        new_status: EntryStatus,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut entry = self
            .entries
            .get_mut(&id)
            .ok_or(LedgerError::NotFound(id.0))?;

        if entry.status != EntryStatus::Pending {
            if entry.status == new_status {
                return Ok(entry.clone());
            }
            return Err(LedgerError::AlreadyTerminal(id.0));
        }

        if new_status == EntryStatus::Pending {
            return Ok(entry.clone());
        }

        let old_status = entry.status;
        entry.status = new_status;
        let updated = entry.clone();
        drop(entry);

        if let Some(mut ids) = self.by_status.get_mut(&old_status) {
            ids.retain(|existing| *existing != id);
        }
        self.by_status.entry(new_status).or_default().push(id);
        Ok(updated)
    }

    fn resolve(&self, ids: &[EntryId]) -> Vec<LedgerEntry> {
        let mut entries: Vec<LedgerEntry> = ids
            .iter()
            .filter_map(|id| self.entries.get(id).map(|e| e.clone()))
            .collect();
        entries.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        entries
    }

    /// Entries sent by `user_id`, newest first.
    pub fn by_sender(&self, user_id: UserId) -> Vec<LedgerEntry> {
        let ids = self
            .by_user
            .get(&user_id)
            .map(|v| v.clone())
            .unwrap_or_default();
        self.resolve(&ids)
    }

    /// Entries received at `address` (any of a user's three chain
    /// addresses), newest first.
    pub fn by_recipient(&self, address: &str) -> Vec<LedgerEntry> {
        let ids = self
            .by_recipient
            .get(address)
            .map(|v| v.clone())
            .unwrap_or_default();
        self.resolve(&ids)
    }

    /// All entries in `status`, used by the monitor loop.
    pub fn by_status(&self, status: EntryStatus) -> Vec<LedgerEntry> {
        let ids = self
            .by_status
            .get(&status)
            .map(|v| v.clone())
            .unwrap_or_default();
        self.resolve(&ids)
    }

    /// Entries for `user_id` whose type is in `types`, newest first.
    pub fn by_user_id_and_type_in(&self, user_id: UserId, types: &[EntryType]) -> Vec<LedgerEntry> {
        self.by_sender(user_id)
            .into_iter()
            .filter(|e| types.contains(&e.entry_type))
            .collect()
    }

    /// Exact lookup by transaction hash.
    pub fn by_hash(&self, hash: &str) -> Option<LedgerEntry> {
        let id = *self.by_hash.get(hash)?;
        self.entries.get(&id).map(|e| e.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: EntryStatus, hash: Option<&str>) -> NewEntry {
        NewEntry {
            user_id: UserId(1),
            recipient: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string(),
            amount: Decimal::new(100, 2),
            token: Token::Eth,
            network: Network::Ethereum,
            tx_hash: hash.map(str::to_string),
            status,
            entry_type: EntryType::Transfer,
        }
    }

    #[test]
    fn rejects_pending_entry_without_hash() {
        let store = LedgerStore::new();
        let err = store.append(sample(EntryStatus::Pending, None)).unwrap_err();
        assert_eq!(err, LedgerError::PendingRequiresHash);
    }

    #[test]
    fn rejects_disallowed_network_token_pair() {
        let store = LedgerStore::new();
        let mut entry = sample(EntryStatus::Confirmed, Some("0xhash"));
        entry.network = Network::Solana; // token is ETH, network SOL: disallowed
        let err = store.append(entry).unwrap_err();
        assert!(matches!(err, LedgerError::DisallowedPair { .. }));
    }

    #[test]
    fn status_transitions_only_once_from_pending() {
        let store = LedgerStore::new();
        let entry = store.append(sample(EntryStatus::Pending, Some("0xabc"))).unwrap();

        let updated = store.update_status(entry.id, EntryStatus::Confirmed).unwrap();
        assert_eq!(updated.status, EntryStatus::Confirmed);

        // Regression / second transition must be rejected.
        let err = store.update_status(entry.id, EntryStatus::Failed).unwrap_err();
        assert_eq!(err, LedgerError::AlreadyTerminal(entry.id.0));

        // Idempotent same-status call succeeds.
        let again = store.update_status(entry.id, EntryStatus::Confirmed).unwrap();
        assert_eq!(again.status, EntryStatus::Confirmed);
    }

    #[test]
    fn by_status_reflects_transitions() {
        let store = LedgerStore::new();
        let entry = store.append(sample(EntryStatus::Pending, Some("0xdef"))).unwrap();
        assert_eq!(store.by_status(EntryStatus::Pending).len(), 1);
        store.update_status(entry.id, EntryStatus::Timeout).unwrap();
        assert_eq!(store.by_status(EntryStatus::Pending).len(), 0);
        assert_eq!(store.by_status(EntryStatus::Timeout).len(), 1);
    }

    #[test]
    fn sent_and_received_are_queryable_and_sorted_desc() {
        let store = LedgerStore::new();
        store.append(sample(EntryStatus::Confirmed, Some("0x1"))).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        store.append(sample(EntryStatus::Confirmed, Some("0x2"))).unwrap();

        let sent = store.by_sender(UserId(1));
        assert_eq!(sent.len(), 2);
        assert!(sent[0].timestamp_ms >= sent[1].timestamp_ms);

        let received = store.by_recipient("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        assert_eq!(received.len(), 2);
    }
}
