// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error taxonomy for wallet operations.
//!
//! Every failure maps to a specific, non-leaking variant. No error in this
//! crate ever carries plaintext key material or a password.

use crate::storage::StorageError;

/// Failure to decrypt or parse stored key material.
///
/// Deliberately a single variant: distinguishing a wrong password from
/// corrupted ciphertext would turn the vault into a decryption oracle.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid password or corrupt key data")]
    InvalidPasswordOrCorruptData,
}

/// Errors surfaced by the chain RPC collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("RPC timeout: {0}")]
    Timeout(String),

    /// The node refused a broadcast. Carries the node's reason (stale nonce,
    /// insufficient funds, underpriced gas) but never key material.
    #[error("node rejected transaction: {0}")]
    Rejected(String),
}

impl ChainError {
    /// Whether a read-only call hitting this error is worth a bounded retry.
    /// Broadcast rejections are not: broadcast is never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChainError::Rpc(_) | ChainError::Timeout(_))
    }
}

/// Top-level error type for the wallet service.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Malformed address, non-positive amount, unsupported token symbol.
    /// Raised before any network or crypto work.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("owner {0} already has an account")]
    DuplicateAccount(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("persistence error: {0}")]
    Persistence(#[from] StorageError),

    /// Local signing failed after key decryption. The message never
    /// contains key material.
    #[error("signing failed: {0}")]
    Signing(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_chain_errors_are_retryable() {
        assert!(ChainError::Rpc("connection reset".into()).is_transient());
        assert!(ChainError::Timeout("deadline exceeded".into()).is_transient());
        assert!(!ChainError::Rejected("nonce too low".into()).is_transient());
        assert!(!ChainError::InvalidRpcUrl("not a url".into()).is_transient());
    }

    #[test]
    fn crypto_error_does_not_name_a_cause() {
        let msg = CryptoError::InvalidPasswordOrCorruptData.to_string();
        assert_eq!(msg, "invalid password or corrupt key data");
    }
}
