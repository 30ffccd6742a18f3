// SPDX-License-Identifier: AGPL-3.0-or-later

//! Transaction pipeline: build, sequence, sign, track.

pub mod builder;
pub mod nonce;
pub mod signer;
pub mod tracker;

pub use builder::{format_amount, parse_address, parse_amount, TransactionBuilder, UnsignedTx};
pub use nonce::{NonceLease, NonceSequencer};
pub use signer::{generate_keypair, sign_and_broadcast, sign_transfer, signer_from_key_bytes};
pub use tracker::TransactionTracker;
