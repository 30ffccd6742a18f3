// SPDX-License-Identifier: AGPL-3.0-or-later

//! Transaction record repository.
//!
//! ## Storage Layout
//!
//! One record per submitted transaction, keyed by normalized hash:
//! ```text
//! {root}/txs/{tx_hash}.json
//! ```
//!
//! Records are an append-only audit trail: they are created Pending at
//! broadcast time, mutated only by reconciliation, and never deleted.

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{JsonStore, StorageError, StorageResult};
use crate::tx::builder::UnsignedTx;

/// Transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Broadcast but not yet mined
    Pending,
    /// Mined with a success receipt
    Confirmed,
    /// Mined but reverted, terminal
    Failed,
}

impl Default for TxStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// What kind of transfer a transaction carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Movement of the chain's base asset
    NativeTransfer,
    /// `transfer(to, amount)` call on an ERC-20 contract
    TokenTransfer,
}

/// Stored transaction record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction hash, lower-case 0x-prefixed hex
    pub tx_hash: String,
    /// Sender address
    pub from_address: String,
    /// Human recipient (for token transfers: the token receiver, not the contract)
    pub to_address: String,
    /// Amount in human-readable asset units, as supplied by the caller
    pub amount: String,
    /// Gas price in wei
    pub gas_price: u128,
    /// Gas limit of the submitted transaction
    pub gas_limit: u64,
    /// Gas actually consumed, known once a receipt arrives
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    /// Nonce the transaction was submitted with
    pub nonce: u64,
    /// Call payload for token transfers, 0x-prefixed hex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_data: Option<String>,
    /// Transfer kind
    pub kind: TransferKind,
    /// Current status
    pub status: TxStatus,
    /// Token contract address (token transfers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    /// Token symbol (token transfers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    /// Block the transaction was mined in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Failure explanation for Failed records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Owner of the sending account
    pub owner_id: String,
    /// When the transaction was broadcast
    pub created_at: DateTime<Utc>,
    /// When the status was last updated
    pub updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Create the Pending record for a just-broadcast transaction.
    pub fn new_pending(unsigned: &UnsignedTx, tx_hash: &str, owner_id: &str) -> Self {
        let now = Utc::now();
        Self {
            tx_hash: tx_hash.to_string(),
            from_address: format_address(unsigned.from),
            to_address: format_address(unsigned.recipient),
            amount: unsigned.amount.clone(),
            gas_price: unsigned.gas_price,
            gas_limit: unsigned.gas_limit,
            gas_used: None,
            nonce: unsigned.nonce,
            payload_data: if unsigned.input.is_empty() {
                None
            } else {
                Some(format!("0x{}", alloy::hex::encode(&unsigned.input)))
            },
            kind: unsigned.kind,
            status: TxStatus::Pending,
            token_address: unsigned.token_address.map(format_address),
            token_symbol: unsigned.token_symbol.clone(),
            block_number: None,
            error: None,
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the record has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status != TxStatus::Pending
    }

    /// Mark the record as confirmed.
    pub fn mark_confirmed(&mut self, block_number: u64, gas_used: u64) {
        self.status = TxStatus::Confirmed;
        self.block_number = Some(block_number);
        self.gas_used = Some(gas_used);
        self.updated_at = Utc::now();
    }

    /// Mark the record as failed with an explanation.
    pub fn mark_failed(&mut self, block_number: u64, gas_used: u64, error: &str) {
        self.status = TxStatus::Failed;
        self.block_number = Some(block_number);
        self.gas_used = Some(gas_used);
        self.error = Some(error.to_string());
        self.updated_at = Utc::now();
    }

    /// Whether `address` (lower-case hex) is the sender or recipient.
    fn involves(&self, address: &str) -> bool {
        self.from_address.eq_ignore_ascii_case(address)
            || self.to_address.eq_ignore_ascii_case(address)
    }
}

/// Lower-case 0x-prefixed hex rendering of an address.
pub fn format_address(address: Address) -> String {
    format!("{address:#x}")
}

/// Repository for transaction records.
pub struct TransactionRepository<'a> {
    store: &'a JsonStore,
}

impl<'a> TransactionRepository<'a> {
    /// Create a new TransactionRepository.
    pub fn new(store: &'a JsonStore) -> Self {
        Self { store }
    }

    /// Check if a record exists for a hash.
    pub fn exists(&self, tx_hash: &str) -> bool {
        self.store.exists(self.store.paths().tx(tx_hash))
    }

    /// Get a record by its normalized hash.
    pub fn get(&self, tx_hash: &str) -> StorageResult<TransactionRecord> {
        let path = self.store.paths().tx(tx_hash);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("transaction {tx_hash}")));
        }
        self.store.read_json(path)
    }

    /// Persist a new record. Fails if the hash is already recorded.
    pub fn create(&self, record: &TransactionRecord) -> StorageResult<()> {
        self.store
            .create_json(self.store.paths().tx(&record.tx_hash), record)
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => {
                    StorageError::AlreadyExists(format!("transaction {}", record.tx_hash))
                }
                other => other,
            })
    }

    /// Update an existing record.
    pub fn update(&self, record: &TransactionRecord) -> StorageResult<()> {
        if !self.exists(&record.tx_hash) {
            return Err(StorageError::NotFound(format!(
                "transaction {}",
                record.tx_hash
            )));
        }
        self.store
            .write_json(self.store.paths().tx(&record.tx_hash), record)
    }

    /// List records involving an address, newest first, paginated.
    ///
    /// `page` is 1-based. Returns the requested page and the total number of
    /// matching records.
    pub fn list_by_address(
        &self,
        address: &str,
        page: usize,
        page_size: usize,
    ) -> StorageResult<(Vec<TransactionRecord>, usize)> {
        let keys = self.store.list_keys(self.store.paths().txs_dir(), "json")?;

        let mut records: Vec<TransactionRecord> = Vec::new();
        for key in &keys {
            if let Ok(record) = self.get(key) {
                if record.involves(address) {
                    records.push(record);
                }
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = records.len();

        let page = page.max(1);
        let start = (page - 1).saturating_mul(page_size);
        let page_records = records
            .into_iter()
            .skip(start)
            .take(page_size)
            .collect();

        Ok((page_records, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use alloy::primitives::{Address, U256};
    use std::str::FromStr;

    fn test_store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = JsonStore::new(StoragePaths::new(dir.path()));
        store.initialize().expect("initialize store");
        (dir, store)
    }

    fn test_unsigned(nonce: u64) -> UnsignedTx {
        let from = Address::from_str("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();
        let to = Address::from_str("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap();
        UnsignedTx {
            from,
            to,
            recipient: to,
            value: U256::from(1_000_000_000_000_000_000u64),
            input: Vec::new(),
            nonce,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            chain_id: 1,
            kind: TransferKind::NativeTransfer,
            amount: "1".to_string(),
            token_address: None,
            token_symbol: None,
        }
    }

    fn test_record(tx_hash: &str, nonce: u64) -> TransactionRecord {
        TransactionRecord::new_pending(&test_unsigned(nonce), tx_hash, "owner-1")
    }

    #[test]
    fn new_pending_starts_pending() {
        let record = test_record("0xaaa", 0);
        assert_eq!(record.status, TxStatus::Pending);
        assert_eq!(record.kind, TransferKind::NativeTransfer);
        assert_eq!(record.amount, "1");
        assert!(record.payload_data.is_none());
        assert!(record.gas_used.is_none());
        assert!(!record.is_terminal());
    }

    #[test]
    fn create_and_get_record() {
        let (_dir, store) = test_store();
        let repo = TransactionRepository::new(&store);

        let record = test_record("0xaaa", 0);
        repo.create(&record).unwrap();

        let loaded = repo.get("0xaaa").unwrap();
        assert_eq!(loaded.tx_hash, "0xaaa");
        assert_eq!(loaded.nonce, 0);
        assert_eq!(loaded.status, TxStatus::Pending);
    }

    #[test]
    fn duplicate_hash_is_rejected() {
        let (_dir, store) = test_store();
        let repo = TransactionRepository::new(&store);

        let record = test_record("0xaaa", 0);
        repo.create(&record).unwrap();

        let result = repo.create(&record);
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn mark_confirmed_sets_receipt_fields() {
        let mut record = test_record("0xaaa", 0);
        record.mark_confirmed(1234, 21_000);

        assert_eq!(record.status, TxStatus::Confirmed);
        assert_eq!(record.block_number, Some(1234));
        assert_eq!(record.gas_used, Some(21_000));
        assert!(record.error.is_none());
        assert!(record.is_terminal());
    }

    #[test]
    fn mark_failed_records_error() {
        let mut record = test_record("0xaaa", 0);
        record.mark_failed(1234, 21_000, "transaction reverted on chain");

        assert_eq!(record.status, TxStatus::Failed);
        assert_eq!(
            record.error.as_deref(),
            Some("transaction reverted on chain")
        );
    }

    #[test]
    fn list_by_address_matches_sender_and_recipient() {
        let (_dir, store) = test_store();
        let repo = TransactionRepository::new(&store);

        for i in 0..3u64 {
            repo.create(&test_record(&format!("0xaaa{i}"), i)).unwrap();
        }

        let sender = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
        let recipient = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
        let stranger = "0x000000000000000000000000000000000000dead";

        let (records, total) = repo.list_by_address(sender, 1, 10).unwrap();
        assert_eq!(total, 3);
        assert_eq!(records.len(), 3);

        let (records, total) = repo.list_by_address(recipient, 1, 10).unwrap();
        assert_eq!(total, 3);
        assert_eq!(records.len(), 3);

        let (records, total) = repo.list_by_address(stranger, 1, 10).unwrap();
        assert_eq!(total, 0);
        assert!(records.is_empty());
    }

    #[test]
    fn list_by_address_paginates() {
        let (_dir, store) = test_store();
        let repo = TransactionRepository::new(&store);

        for i in 0..5u64 {
            repo.create(&test_record(&format!("0xaaa{i}"), i)).unwrap();
        }

        let sender = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
        let (page1, total) = repo.list_by_address(sender, 1, 2).unwrap();
        assert_eq!(total, 5);
        assert_eq!(page1.len(), 2);

        let (page3, _) = repo.list_by_address(sender, 3, 2).unwrap();
        assert_eq!(page3.len(), 1);

        let (beyond, _) = repo.list_by_address(sender, 4, 2).unwrap();
        assert!(beyond.is_empty());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&TxStatus::Confirmed).unwrap();
        assert_eq!(json, r#""confirmed""#);

        let json = serde_json::to_string(&TransferKind::TokenTransfer).unwrap();
        assert_eq!(json, r#""token_transfer""#);
    }
}
