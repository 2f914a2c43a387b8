//! Chart-of-accounts errors.

use tally_shared::types::AccountId;
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors raised by structural operations on the account tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    // ========== Lookup ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// Parent account not found.
    #[error("Parent account {0} does not exist")]
    ParentNotFound(AccountId),

    /// Merge target named by a rename does not exist.
    #[error("Account {name} does not exist in company {company}, nothing to merge into")]
    MergeTargetNotFound {
        /// Requested name.
        name: String,
        /// Company searched.
        company: String,
    },

    // ========== Validation ==========
    /// Account name is blank.
    #[error("Account name cannot be empty")]
    EmptyName,

    /// Root accounts must state their report type.
    #[error("Report type is mandatory for root account {0}")]
    ReportTypeMissing(String),

    // ========== Structure ==========
    /// Parent is a ledger account.
    #[error("Parent account {0} is not a group")]
    ParentIsLedger(String),

    /// Account named as its own parent.
    #[error("Account {0} cannot be its own parent")]
    SelfParent(String),

    /// New parent lies inside the account's own subtree.
    #[error("Cannot move {account} under its descendant {parent}")]
    CyclicParent {
        /// Account being moved.
        account: String,
        /// Requested parent.
        parent: String,
    },

    /// Another account with this name exists in the company.
    #[error("Account {name} already exists in company {company}")]
    DuplicateName {
        /// The duplicated name.
        name: String,
        /// The company.
        company: String,
    },

    /// Child and parent belong to different companies.
    #[error("Account {account} belongs to company {company}, parent belongs to {parent_company}")]
    CompanyMismatch {
        /// Child account name.
        account: String,
        /// Child company.
        company: String,
        /// Parent company.
        parent_company: String,
    },

    /// Roots cannot be edited or deleted.
    #[error("Root account {0} cannot be edited or deleted")]
    RootImmutable(String),

    /// Group still has children.
    #[error("Account {0} has child accounts")]
    ChildExists(String),

    /// Ledger entries reference the account.
    #[error("Account {0} has existing ledger entries")]
    TransactionsExist(String),

    /// Ledger with an account type cannot become a group.
    #[error("Account {0} has an account type set and cannot become a group")]
    AccountTypeSet(String),

    /// Merge target differs in group flag, report type or company.
    #[error("Cannot merge {from} into {into}: group flag, report type and company must match")]
    MergeMismatch {
        /// Account being merged away.
        from: String,
        /// Surviving account.
        into: String,
    },

    /// Nested-set bounds of a node escape its ancestor.
    #[error("Nested-set containment broken between {ancestor} and {node}")]
    ContainmentBroken {
        /// Outer node.
        ancestor: String,
        /// Inner node.
        node: String,
    },

    // ========== Authorization ==========
    /// Caller lacks the frozen-accounts modifier role.
    #[error("Not authorized to change the frozen status of account {0}")]
    FreezeNotPermitted(String),
}

impl AccountError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::ParentNotFound(_) | Self::MergeTargetNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::EmptyName | Self::ReportTypeMissing(_) => ErrorKind::Validation,
            Self::FreezeNotPermitted(_) => ErrorKind::Authorization,
            Self::ParentIsLedger(_)
            | Self::SelfParent(_)
            | Self::CyclicParent { .. }
            | Self::DuplicateName { .. }
            | Self::CompanyMismatch { .. }
            | Self::RootImmutable(_)
            | Self::ChildExists(_)
            | Self::TransactionsExist(_)
            | Self::AccountTypeSet(_)
            | Self::MergeMismatch { .. }
            | Self::ContainmentBroken { .. } => ErrorKind::Invariant,
        }
    }

    /// Returns a stable machine-readable code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::MergeTargetNotFound { .. } => "MERGE_TARGET_NOT_FOUND",
            Self::EmptyName => "EMPTY_ACCOUNT_NAME",
            Self::ReportTypeMissing(_) => "REPORT_TYPE_MISSING",
            Self::ParentIsLedger(_) => "PARENT_IS_LEDGER",
            Self::SelfParent(_) => "SELF_PARENT",
            Self::CyclicParent { .. } => "CYCLIC_PARENT",
            Self::DuplicateName { .. } => "DUPLICATE_ACCOUNT_NAME",
            Self::CompanyMismatch { .. } => "COMPANY_MISMATCH",
            Self::RootImmutable(_) => "ROOT_ACCOUNT",
            Self::ChildExists(_) => "CHILD_EXISTS",
            Self::TransactionsExist(_) => "TRANSACTIONS_EXIST",
            Self::AccountTypeSet(_) => "ACCOUNT_TYPE_SET",
            Self::MergeMismatch { .. } => "MERGE_MISMATCH",
            Self::ContainmentBroken { .. } => "CONTAINMENT_BROKEN",
            Self::FreezeNotPermitted(_) => "FREEZE_NOT_PERMITTED",
        }
    }

    /// Returns the identifier of the offending account.
    #[must_use]
    pub fn entity(&self) -> String {
        match self {
            Self::NotFound(id) | Self::ParentNotFound(id) => id.to_string(),
            Self::EmptyName => String::new(),
            Self::MergeTargetNotFound { name, .. } | Self::DuplicateName { name, .. } => {
                name.clone()
            }
            Self::ReportTypeMissing(name)
            | Self::ParentIsLedger(name)
            | Self::SelfParent(name)
            | Self::RootImmutable(name)
            | Self::ChildExists(name)
            | Self::TransactionsExist(name)
            | Self::AccountTypeSet(name)
            | Self::FreezeNotPermitted(name)
            | Self::CyclicParent { account: name, .. }
            | Self::CompanyMismatch { account: name, .. }
            | Self::MergeMismatch { from: name, .. }
            | Self::ContainmentBroken { node: name, .. } => name.clone(),
        }
    }

    /// Returns true if retrying may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
