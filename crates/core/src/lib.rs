//! Core business logic for Tally.
//!
//! A general ledger posting and reconciliation engine with no storage or
//! network dependencies.
//!
//! # Modules
//!
//! - `accounts` - Chart of accounts as a nested-set tree
//! - `ledger` - Ledger rows, validation, the append-only log and its index
//! - `voucher` - Documents that post to the ledger and their lifecycle
//! - `period` - Frozen-period, frozen-account and balance-sign checks
//! - `reconciliation` - Outstanding amounts and payment allocation
//! - `engine` - The concurrent posting engine tying it together
//! - `reports` - Trial balance

pub mod accounts;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod masters;
pub mod period;
pub mod reconciliation;
pub mod reports;
pub mod voucher;

pub use engine::{DocumentRecord, GeneralLedger, PostedEntrySet};
pub use error::ErrorKind;
