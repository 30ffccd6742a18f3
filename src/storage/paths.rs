// SPDX-License-Identifier: AGPL-3.0-or-later

//! Path constants and utilities for the persistent store layout.

use std::path::{Path, PathBuf};

/// Default base directory for persistent wallet data.
pub const DATA_ROOT: &str = "/var/lib/custody";

/// Storage path utilities for the wallet data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persistent data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Account Paths ==========

    /// Directory containing all managed accounts.
    pub fn accounts_dir(&self) -> PathBuf {
        self.root.join("accounts")
    }

    /// Path to an owner's account file. One file per owner is what enforces
    /// the one-account-per-owner constraint.
    pub fn account(&self, owner_id: &str) -> PathBuf {
        self.accounts_dir().join(format!("{owner_id}.json"))
    }

    // ========== Transaction Paths ==========

    /// Directory containing all transaction records.
    pub fn txs_dir(&self) -> PathBuf {
        self.root.join("txs")
    }

    /// Path to a transaction record, keyed by its normalized hash.
    pub fn tx(&self, tx_hash: &str) -> PathBuf {
        self.txs_dir().join(format!("{tx_hash}.json"))
    }
}
