// SPDX-License-Identifier: AGPL-3.0-or-later

//! Chain RPC abstraction.
//!
//! The wallet core talks to the chain through the [`ChainClient`] trait so
//! that signing, nonce sequencing, and reconciliation can be tested against
//! an in-process mock. [`client::EvmClient`] is the production implementation
//! over an alloy HTTP provider.

pub mod client;
pub mod erc20;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::error::ChainError;

/// Receipt for a mined transaction.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    /// Whether execution succeeded
    pub success: bool,
    /// Block the transaction was included in
    pub block_number: u64,
    /// Gas actually consumed
    pub gas_used: u64,
}

/// On-chain token metadata read from the contract.
#[derive(Debug, Clone)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Lowercase a transaction hash and ensure the `0x` prefix.
///
/// Hashes are record keys and must compare byte-equal regardless of how the
/// node capitalized them.
pub fn normalize_tx_hash(hash: &str) -> String {
    let lower = hash.trim().to_ascii_lowercase();
    if lower.starts_with("0x") {
        lower
    } else {
        format!("0x{lower}")
    }
}

/// Whether a normalized hash is `0x` followed only by hex digits.
///
/// Hashes double as storage file names, so anything else (separators, dots)
/// must be rejected before it reaches a path.
pub fn is_hex_hash(hash: &str) -> bool {
    hash.strip_prefix("0x")
        .is_some_and(|h| !h.is_empty() && h.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Read and broadcast operations the wallet core needs from a node.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Confirmed transaction count for an address (the next valid nonce).
    async fn get_nonce(&self, address: Address) -> Result<u64, ChainError>;

    /// Current network gas price in wei.
    async fn get_gas_price(&self) -> Result<u128, ChainError>;

    /// Native asset balance in wei.
    async fn get_native_balance(&self, address: Address) -> Result<U256, ChainError>;

    /// ERC-20 balance of `holder` in the token's base units.
    async fn get_token_balance(&self, token: Address, holder: Address)
        -> Result<U256, ChainError>;

    /// Name, symbol, and decimals read from the token contract.
    async fn get_token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainError>;

    /// Submit a signed raw transaction. Returns the normalized tx hash.
    async fn broadcast(&self, raw: &[u8]) -> Result<String, ChainError>;

    /// Receipt for a broadcast transaction, `None` while still pending.
    async fn get_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, ChainError>;
}
