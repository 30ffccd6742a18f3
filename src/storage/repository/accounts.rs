// SPDX-License-Identifier: AGPL-3.0-or-later

//! Account repository.
//!
//! ## Storage Layout
//!
//! One file per owner:
//! ```text
//! {root}/accounts/{owner_id}.json
//! ```
//!
//! ## Security
//!
//! The private key is stored only as vault ciphertext. The plaintext key
//! never touches the store, and [`AccountView`] is what leaves the crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{JsonStore, StorageError, StorageResult};

/// A managed account: one per owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// EVM address, lower-case 0x-prefixed hex, derived once at creation
    pub address: String,
    /// Vault ciphertext of the private key (base64 `nonce ‖ ct`)
    pub encrypted_key: String,
    /// Base64 KDF salt, unique to this account
    pub salt: String,
    /// Owner this account belongs to
    pub owner_id: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Caller-facing account view (never includes key material).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountView {
    /// EVM address
    pub address: String,
    /// Owner this account belongs to
    pub owner_id: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            address: account.address,
            owner_id: account.owner_id,
            created_at: account.created_at,
        }
    }
}

/// Repository for account persistence.
pub struct AccountRepository<'a> {
    store: &'a JsonStore,
}

impl<'a> AccountRepository<'a> {
    /// Create a new AccountRepository.
    pub fn new(store: &'a JsonStore) -> Self {
        Self { store }
    }

    /// Check if an owner already has an account.
    pub fn exists(&self, owner_id: &str) -> bool {
        self.store.exists(self.store.paths().account(owner_id))
    }

    /// Get an owner's account.
    pub fn get(&self, owner_id: &str) -> StorageResult<Account> {
        let path = self.store.paths().account(owner_id);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("account for {owner_id}")));
        }
        self.store.read_json(path)
    }

    /// Get an owner's account, or None if they have none.
    pub fn find(&self, owner_id: &str) -> StorageResult<Option<Account>> {
        match self.get(owner_id) {
            Ok(account) => Ok(Some(account)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Persist a new account. Fails if the owner already has one.
    ///
    /// Create-new at the filesystem level, so two racing creators cannot
    /// both succeed and the loser never overwrites the winner's key.
    pub fn create(&self, account: &Account) -> StorageResult<()> {
        self.store
            .create_json(self.store.paths().account(&account.owner_id), account)
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => {
                    StorageError::AlreadyExists(format!("account for {}", account.owner_id))
                }
                other => other,
            })
    }
}
