// SPDX-License-Identifier: AGPL-3.0-or-later

//! Offline signing and broadcast.
//!
//! Signing happens entirely in-process against the decrypted key; only the
//! signed raw bytes ever reach the RPC client. Broadcast is attempted exactly
//! once per signed payload, never retried, so a timeout cannot double-spend
//! a nonce.

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::TxKind;
use alloy::signers::local::PrivateKeySigner;

use super::builder::UnsignedTx;
use crate::chain::ChainClient;
use crate::error::WalletError;

/// Generate a fresh random keypair.
pub fn generate_keypair() -> PrivateKeySigner {
    PrivateKeySigner::random()
}

/// Reconstruct a signer from raw 32-byte key material.
pub fn signer_from_key_bytes(key: &[u8]) -> Result<PrivateKeySigner, WalletError> {
    PrivateKeySigner::from_slice(key)
        .map_err(|_| WalletError::Signing("stored key material is not a valid key".to_string()))
}

/// Sign a transfer, producing the EIP-2718 raw bytes ready for broadcast.
pub fn sign_transfer(unsigned: &UnsignedTx, signer: &PrivateKeySigner) -> Result<Vec<u8>, WalletError> {
    let mut tx = TxLegacy {
        chain_id: Some(unsigned.chain_id),
        nonce: unsigned.nonce,
        gas_price: unsigned.gas_price,
        gas_limit: unsigned.gas_limit,
        to: TxKind::Call(unsigned.to),
        value: unsigned.value,
        input: unsigned.input.clone().into(),
    };

    let signature = signer
        .sign_transaction_sync(&mut tx)
        .map_err(|e| WalletError::Signing(e.to_string()))?;

    let envelope = TxEnvelope::Legacy(tx.into_signed(signature));
    Ok(envelope.encoded_2718())
}

/// Sign and submit a transfer. Returns the normalized transaction hash.
pub async fn sign_and_broadcast(
    client: &dyn ChainClient,
    unsigned: &UnsignedTx,
    signer: &PrivateKeySigner,
) -> Result<String, WalletError> {
    let raw = sign_transfer(unsigned, signer)?;
    let tx_hash = client.broadcast(&raw).await?;
    Ok(tx_hash)
}
