//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Ledger rows and candidate rows (drafts)
//! - Row and entry set validation
//! - Mirror rows for cancellation
//! - The append-only log and its balance index
//! - Domain types and error types for ledger operations

pub mod balance;
pub mod entry;
pub mod error;
pub mod reversal;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod validation_props;

pub use balance::{AccountBalance, BalanceIndex};
pub use entry::{EntryDraft, EntryHeader, LedgerEntry};
pub use error::LedgerError;
pub use reversal::ReversalService;
pub use service::LedgerService;
pub use store::LedgerStore;
pub use types::{DocStatus, OutstandingKey, VoucherKey, VoucherType};
