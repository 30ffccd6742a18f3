// SPDX-License-Identifier: AGPL-3.0-or-later

//! Typed repositories layered over the JSON store.

pub mod accounts;
pub mod transactions;

pub use accounts::{Account, AccountRepository, AccountView};
pub use transactions::{
    format_address, TransactionRecord, TransactionRepository, TransferKind, TxStatus,
};
