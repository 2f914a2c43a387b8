//! Chart of accounts.
//!
//! - Account node types and the creation builder
//! - The nested-set indexed account tree
//! - Structural error types

pub mod error;
pub mod tree;
pub mod types;

#[cfg(test)]
mod tree_props;

pub use error::AccountError;
pub use tree::AccountTree;
pub use types::{
    Account, AccountType, BalanceMustBe, NewAccount, NormalBalance, RenameOutcome, ReportType,
};
