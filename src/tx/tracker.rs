// SPDX-License-Identifier: AGPL-3.0-or-later

//! Transaction lifecycle tracking.
//!
//! Every broadcast is recorded as `Pending` in the same logical step as the
//! chain send. Reconciliation later settles the record from the on-chain
//! receipt. Terminal records are never touched again, so reconciling is
//! idempotent and safe to call from a poller.

use std::sync::Arc;

use crate::chain::{is_hex_hash, normalize_tx_hash, ChainClient};
use crate::error::WalletError;
use crate::storage::{JsonStore, TransactionRecord, TransactionRepository};
use crate::tx::builder::UnsignedTx;

/// Records broadcasts and reconciles their status against receipts.
pub struct TransactionTracker<'a> {
    repo: TransactionRepository<'a>,
    client: Arc<dyn ChainClient>,
}

impl<'a> TransactionTracker<'a> {
    pub fn new(store: &'a JsonStore, client: Arc<dyn ChainClient>) -> Self {
        Self {
            repo: TransactionRepository::new(store),
            client,
        }
    }

    /// Persist a just-broadcast transfer as `Pending`.
    ///
    /// Must run in the same logical step as the broadcast itself; a send
    /// without a pending record is invisible to reconciliation.
    pub fn record_pending(
        &self,
        unsigned: &UnsignedTx,
        tx_hash: &str,
        owner_id: &str,
    ) -> Result<TransactionRecord, WalletError> {
        let record = TransactionRecord::new_pending(unsigned, &normalize_tx_hash(tx_hash), owner_id);
        self.repo.create(&record)?;

        tracing::info!(
            tx_hash = %record.tx_hash,
            nonce = record.nonce,
            kind = ?record.kind,
            "recorded pending transaction"
        );
        Ok(record)
    }

    /// Settle a record against the chain.
    ///
    /// Pending records pick up the receipt's outcome when one exists and
    /// stay `Pending` otherwise. Terminal records are returned as-is without
    /// touching the chain.
    pub async fn reconcile(&self, tx_hash: &str) -> Result<TransactionRecord, WalletError> {
        let tx_hash = normalize_tx_hash(tx_hash);
        // The hash is about to become a storage file name.
        if !is_hex_hash(&tx_hash) {
            return Err(WalletError::Validation(format!(
                "invalid transaction hash `{tx_hash}`"
            )));
        }
        let mut record = self.repo.get(&tx_hash)?;

        if record.is_terminal() {
            return Ok(record);
        }

        let Some(receipt) = self.client.get_receipt(&tx_hash).await? else {
            return Ok(record);
        };

        if receipt.success {
            record.mark_confirmed(receipt.block_number, receipt.gas_used);
        } else {
            record.mark_failed(
                receipt.block_number,
                receipt.gas_used,
                "transaction reverted on-chain",
            );
        }
        self.repo.update(&record)?;

        tracing::info!(
            tx_hash = %record.tx_hash,
            status = ?record.status,
            block = ?record.block_number,
            "reconciled transaction"
        );
        Ok(record)
    }
}
