// SPDX-License-Identifier: AGPL-3.0-or-later

//! Custody Core - Custodial Wallet Engine
//!
//! This crate custodies private keys and submits signed transfers on their
//! owners' behalf. Keys are generated in-process, encrypted at rest under a
//! password-derived key, and decrypted only for the duration of a signing
//! operation. Sends are nonce-sequenced per address so concurrent submissions
//! never collide and a failed broadcast never burns a nonce.
//!
//! The HTTP/CLI surface is an external consumer; [`service::WalletService`]
//! is the boundary this crate exposes.
//!
//! ## Modules
//!
//! - `vault` - Password-based key encryption (PBKDF2 + AES-256-GCM)
//! - `registry` - Account creation and unlock
//! - `chain` - Chain RPC abstraction (alloy)
//! - `tx` - Transaction pipeline: build, sequence, sign, track
//! - `storage` - JSON-file persistence
//! - `service` - Caller-facing operations

pub mod chain;
pub mod config;
pub mod error;
pub mod registry;
pub mod service;
pub mod storage;
pub mod tx;
pub mod vault;

pub use error::{ChainError, CryptoError, WalletError};
pub use service::{BalanceSummary, SendRequest, TokenBalance, WalletService};
