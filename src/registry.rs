// SPDX-License-Identifier: AGPL-3.0-or-later

//! Account registry: key generation, encryption at rest, and unlock.
//!
//! One account per owner. The keypair is generated in-process, the private
//! key is immediately encrypted under the owner's credential secret, and
//! only ciphertext is persisted. Unlocking re-derives the key for the
//! duration of a signing operation.

use alloy::signers::local::PrivateKeySigner;
use chrono::Utc;
use zeroize::Zeroizing;

use crate::error::WalletError;
use crate::storage::{
    format_address, Account, AccountRepository, AccountView, JsonStore, StorageError,
};
use crate::tx::{generate_keypair, signer_from_key_bytes};
use crate::vault::KeyVault;

/// Creates, looks up, and unlocks owner accounts.
pub struct AccountRegistry<'a> {
    repo: AccountRepository<'a>,
    vault: KeyVault,
}

impl<'a> AccountRegistry<'a> {
    pub fn new(store: &'a JsonStore) -> Self {
        Self {
            repo: AccountRepository::new(store),
            vault: KeyVault::new(),
        }
    }

    /// Generate a keypair and persist it encrypted under the owner's secret.
    ///
    /// Fails with [`WalletError::DuplicateAccount`] if the owner already has
    /// one; the existing key is never overwritten.
    pub fn create_account(
        &self,
        owner_id: &str,
        credential_secret: &str,
    ) -> Result<AccountView, WalletError> {
        validate_owner_id(owner_id)?;
        if credential_secret.is_empty() {
            return Err(WalletError::Validation(
                "credential secret must not be empty".to_string(),
            ));
        }
        if self.repo.exists(owner_id) {
            return Err(WalletError::DuplicateAccount(owner_id.to_string()));
        }

        let signer = generate_keypair();
        let key_bytes = Zeroizing::new(signer.to_bytes().0);
        let (encrypted_key, salt) = self.vault.encrypt(key_bytes.as_ref(), credential_secret)?;

        let account = Account {
            address: format_address(signer.address()),
            encrypted_key,
            salt,
            owner_id: owner_id.to_string(),
            created_at: Utc::now(),
        };
        // The store's create-new is the authoritative uniqueness check; the
        // exists() above is only a fast path, and a racing loser lands here.
        self.repo.create(&account).map_err(|e| match e {
            StorageError::AlreadyExists(_) => WalletError::DuplicateAccount(owner_id.to_string()),
            other => WalletError::Persistence(other),
        })?;

        tracing::info!(owner_id, address = %account.address, "created account");
        Ok(account.into())
    }

    /// Look up an owner's account.
    pub fn get_account(&self, owner_id: &str) -> Result<AccountView, WalletError> {
        Ok(self.repo.get(owner_id)?.into())
    }

    /// Decrypt an owner's key and return a signer for one operation.
    ///
    /// A wrong secret surfaces as [`WalletError::Crypto`] with no hint of
    /// which check failed.
    pub fn unlock(
        &self,
        owner_id: &str,
        credential_secret: &str,
    ) -> Result<PrivateKeySigner, WalletError> {
        let account = self.repo.get(owner_id)?;
        let key_bytes =
            self.vault
                .decrypt(&account.encrypted_key, credential_secret, &account.salt)?;
        signer_from_key_bytes(&key_bytes)
    }
}

/// Owner ids become file names; keep them boring.
fn validate_owner_id(owner_id: &str) -> Result<(), WalletError> {
    if owner_id.is_empty() || owner_id.len() > 128 {
        return Err(WalletError::Validation(
            "owner id must be 1-128 characters".to_string(),
        ));
    }
    if !owner_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(WalletError::Validation(
            "owner id may only contain letters, digits, `-`, `_`, `.`".to_string(),
        ));
    }
    // `.` alone (or doubled) would escape the accounts directory.
    if owner_id.chars().all(|c| c == '.') {
        return Err(WalletError::Validation("invalid owner id".to_string()));
    }
    Ok(())
}
