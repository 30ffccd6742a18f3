// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Persistence Module
//!
//! JSON-file persistence for accounts and transaction records.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//!   accounts/
//!     {owner_id}.json   # One account per owner (unique constraint by name)
//!   txs/
//!     {tx_hash}.json    # Append-only transaction records
//! ```
//!
//! Writes are atomic (temp file + rename); each logical pipeline step
//! commits as exactly one rename. File naming enforces the unique
//! constraints on `owner_id` and `tx_hash`.

pub mod fs;
pub mod paths;
pub mod repository;

pub use fs::{JsonStore, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{
    format_address, Account, AccountRepository, AccountView, TransactionRecord,
    TransactionRepository, TransferKind, TxStatus,
};
