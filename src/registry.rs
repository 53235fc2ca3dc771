//! User registry: owns the (user → {addr, key}×3) mapping, lookup by any
//! address.
//!
//! Modeled on the same `DashMap`-backed, row-local-locking idiom as
//! [`crate::ledger::LedgerStore`], with secondary indexes by username and
//! by each of the three chain addresses.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::chain::GeneratedKeypair;
use crate::error::RegistryError;
use crate::seed;
use crate::types::{EvmCredentials, SolanaCredentials, User, UserId, XrpCredentials};

#[derive(Default)]
pub struct UserRegistry {
    users: DashMap<UserId, User>,
    by_username: DashMap<String, UserId>,
    by_address: DashMap<String, UserId>,
    next_id: AtomicU64,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a brand-new user with freshly generated keypairs on all
    /// three chains. Credentials are persisted; funding is the caller's
    /// responsibility (the registry never talks to an adapter's RPC).
    pub fn create(
        &self,
        username: &str,
        evm: GeneratedKeypair,
        xrp: GeneratedKeypair,
        solana: GeneratedKeypair,
    ) -> Result<User, RegistryError> {
        if self.by_username.contains_key(username) {
            return Err(RegistryError::UsernameTaken(username.to_string()));
        }

        let id = UserId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let user = User {
            id,
            username: username.to_string(),
            evm: Some(EvmCredentials {
                address: evm.address.clone(),
                private_key_hex: evm.signing_material,
            }),
            xrp: Some(XrpCredentials {
                address: xrp.address.clone(),
                seed_hex: xrp.signing_material,
            }),
            solana: Some(SolanaCredentials {
                public_key: solana.address.clone(),
                secret_key_b64: solana.signing_material,
            }),
        };

        self.by_username.insert(username.to_string(), id);
        self.by_address.insert(evm.address, id);
        self.by_address.insert(xrp.address, id);
        self.by_address.insert(solana.address, id);
        self.users.insert(id, user.clone());
        Ok(user)
    }

    pub fn by_id(&self, id: UserId) -> Option<User> {
        self.users.get(&id).map(|u| u.clone())
    }

    pub fn by_username(&self, username: &str) -> Option<User> {
        let id = *self.by_username.get(username)?;
        self.by_id(id)
    }

    /// Resolves a user by any of their three chain addresses; used by the
    /// funding path and by "received" queries that need to map a
    /// recipient address back to a user.
    pub fn by_address(&self, address: &str) -> Option<User> {
        let id = *self.by_address.get(address)?;
        self.by_id(id)
    }

    /// Replaces `user`'s XRP credential triple with a freshly generated
    /// one. Serialized per user: the whole triple is swapped atomically
    /// under the row's `DashMap` shard lock, never left half-updated.
    /// Funding the new address is the caller's responsibility.
    pub fn regenerate_xrp(
        &self,
        user_id: UserId,
        xrp: GeneratedKeypair,
    ) -> Result<User, RegistryError> {
        let mut entry = self
            .users
            .get_mut(&user_id)
            .ok_or(RegistryError::NotFound(user_id.0))?;

        if let Some(old) = entry.xrp.as_ref() {
            self.by_address.remove(&old.address);
        }
        entry.xrp = Some(XrpCredentials {
            address: xrp.address.clone(),
            seed_hex: xrp.signing_material,
        });
        let updated = entry.clone();
        drop(entry);

        self.by_address.insert(xrp.address, user_id);
        Ok(updated)
    }

    /// Decodes a stored XRP seed back to entropy, surfacing the codec's
    /// `RegenerateWallet`/`UnsupportedFormat` distinction to the caller.
    pub fn xrp_entropy(&self, user: &User) -> Result<seed::SeedEntropy, crate::error::SeedError> {
        let creds = user
            .xrp
            .as_ref()
            .ok_or_else(|| crate::error::SeedError::UnsupportedFormat("user has no XRP credentials".to_string()))?;
        seed::decode(&creds.seed_hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(address: &str, material: &str) -> GeneratedKeypair {
        GeneratedKeypair {
            address: address.to_string(),
            signing_material: material.to_string(),
        }
    }

    #[test]
    fn create_registers_user_and_all_three_address_indexes() {
        let registry = UserRegistry::new();
        let user = registry
            .create("alice", kp("0xabc", "key"), kp("rAddr", "seed"), kp("solPub", "secret"))
            .unwrap();

        assert_eq!(registry.by_username("alice").unwrap().id, user.id);
        assert_eq!(registry.by_address("0xabc").unwrap().id, user.id);
        assert_eq!(registry.by_address("rAddr").unwrap().id, user.id);
        assert_eq!(registry.by_address("solPub").unwrap().id, user.id);
    }

    #[test]
    fn rejects_duplicate_username() {
        let registry = UserRegistry::new();
        registry
            .create("alice", kp("0xabc", "key"), kp("rAddr", "seed"), kp("solPub", "secret"))
            .unwrap();
        let err = registry
            .create("alice", kp("0xdef", "key2"), kp("rAddr2", "seed2"), kp("solPub2", "secret2"))
            .unwrap_err();
        assert_eq!(err, RegistryError::UsernameTaken("alice".to_string()));
    }

    #[test]
    fn regenerate_xrp_replaces_triple_and_reindexes_address() {
        let registry = UserRegistry::new();
        let user = registry
            .create("bob", kp("0xabc", "key"), kp("rOld", "seed"), kp("solPub", "secret"))
            .unwrap();

        let updated = registry.regenerate_xrp(user.id, kp("rNew", "newseed")).unwrap();
        assert_eq!(updated.xrp.unwrap().address, "rNew");
        assert!(registry.by_address("rOld").is_none());
        assert_eq!(registry.by_address("rNew").unwrap().id, user.id);
    }
}
