//! Ledger error types for validation, authorization and state errors.
//!
//! Every rejected posting, cancellation or reconciliation surfaces as a
//! [`LedgerError`]. Nothing is written to the ledger when one is returned.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;
use thiserror::Error;

use super::types::{DocStatus, VoucherKey};
use crate::accounts::{AccountError, BalanceMustBe};
use crate::error::ErrorKind;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Row Validation ==========
    /// A mandatory field is empty.
    #[error("{field} is mandatory")]
    MissingField {
        /// Field name.
        field: &'static str,
    },

    /// Row has neither a debit nor a credit.
    #[error("Entry on account {account} has no amount")]
    ZeroAmount {
        /// Account name.
        account: String,
    },

    /// Row has both a debit and a credit.
    #[error("Entry on account {account} cannot have both debit and credit")]
    BothDebitAndCredit {
        /// Account name.
        account: String,
    },

    /// Row carries a negative amount.
    #[error("Entry on account {account} has a negative amount")]
    NegativeAmount {
        /// Account name.
        account: String,
    },

    /// P&L row without a cost center.
    #[error("Cost center is required for profit and loss account {account}")]
    CostCenterRequired {
        /// Account name.
        account: String,
    },

    /// Cost center is not registered.
    #[error("Cost center {0} does not exist")]
    UnknownCostCenter(String),

    /// Cost center belongs to another company.
    #[error("Cost center {cost_center} does not belong to company {company}")]
    CostCenterCompanyMismatch {
        /// Cost center name.
        cost_center: String,
        /// Voucher company.
        company: String,
    },

    /// Opening entry against a P&L account.
    #[error("Opening entries are not allowed against profit and loss account {account}")]
    OpeningOnProfitAndLoss {
        /// Account name.
        account: String,
    },

    /// Account belongs to another company.
    #[error("Account {account} does not belong to company {company}")]
    AccountCompanyMismatch {
        /// Account name.
        account: String,
        /// Voucher company.
        company: String,
    },

    /// Fiscal year is not registered.
    #[error("Fiscal year {0} does not exist")]
    UnknownFiscalYear(String),

    /// Posting date lies outside the named fiscal year.
    #[error("Posting date {date} is not within fiscal year {fiscal_year}")]
    PostingDateOutsideFiscalYear {
        /// Posting date.
        date: NaiveDate,
        /// Fiscal year name.
        fiscal_year: String,
    },

    /// Master data registration rejected.
    #[error("Invalid master record {name}: {reason}")]
    InvalidMasterData {
        /// Record name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    // ========== Voucher Validation ==========
    /// Voucher produced no rows.
    #[error("{0} produces no ledger entries")]
    NoEntries(VoucherKey),

    /// Rounded debit and credit totals differ.
    #[error("{voucher} is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// The voucher.
        voucher: VoucherKey,
        /// Rounded debit total.
        debit: Decimal,
        /// Rounded credit total.
        credit: Decimal,
    },

    /// Variant-specific rule failed.
    #[error("{voucher}: {reason}")]
    InvalidVoucher {
        /// The voucher.
        voucher: VoucherKey,
        /// What is wrong.
        reason: String,
    },

    /// Invoice grand total does not match its lines and taxes.
    #[error("{voucher}: grand total {actual} does not match computed total {expected}")]
    GrandTotalMismatch {
        /// The invoice.
        voucher: VoucherKey,
        /// Items plus added minus deducted taxes.
        expected: Decimal,
        /// Stated grand total.
        actual: Decimal,
    },

    /// Source line of an allocation changed since it was read.
    #[error("Line {line} of {voucher} is no longer unadjusted for {expected}")]
    StaleAllocation {
        /// Source journal voucher.
        voucher: VoucherKey,
        /// Line index.
        line: usize,
        /// Amount the caller expected to find.
        expected: Decimal,
    },

    /// Supplier bill already booked on another purchase invoice.
    #[error("{voucher}: already booked against Bill No. {bill_no} in Purchase Invoice {existing}")]
    DuplicateBillNo {
        /// The invoice being validated.
        voucher: VoucherKey,
        /// Supplier bill number.
        bill_no: String,
        /// Invoice that already carries the bill.
        existing: String,
    },

    // ========== Invariant ==========
    /// Posting to a group account.
    #[error("Account {account} is a group; entries can only be posted to ledger accounts")]
    GroupAccountPosting {
        /// Account name.
        account: String,
    },

    /// Posting to a disabled account.
    #[error("Account {account} is disabled")]
    AccountDisabled {
        /// Account name.
        account: String,
    },

    /// Posting against a disabled party.
    #[error("Party {0} is disabled")]
    PartyDisabled(String),

    /// Running balance would take the forbidden sign.
    #[error("Balance of account {account} must be {must_be:?}; it would become {balance}")]
    BalanceTypeViolation {
        /// Account name.
        account: String,
        /// Required sign.
        must_be: BalanceMustBe,
        /// Debit minus credit after the posting.
        balance: Decimal,
    },

    /// Chart-of-accounts error.
    #[error(transparent)]
    Account(#[from] AccountError),

    // ========== Authorization ==========
    /// Posting into a frozen period without the modifier role.
    #[error("Entries dated on or before {frozen_upto} are frozen; {date} is not allowed")]
    FrozenPeriod {
        /// Posting date.
        date: NaiveDate,
        /// Configured freeze date.
        frozen_upto: NaiveDate,
    },

    /// Posting into a frozen account without the modifier role.
    #[error("Account {account} is frozen")]
    FrozenAccount {
        /// Account name.
        account: String,
    },

    /// Reference date further out than the party's credit days, without the
    /// credit controller role.
    #[error("Can not allow credit more than {credit_days} days to {party}; reference date is {days} days out")]
    CreditDaysExceeded {
        /// Party name.
        party: String,
        /// Allowed days.
        credit_days: u32,
        /// Days between posting and reference date.
        days: i64,
    },

    /// Party balance above its credit limit, without the credit controller role.
    #[error("Outstanding of {party} would be {outstanding}, above the credit limit of {credit_limit}")]
    CreditLimitExceeded {
        /// Party name.
        party: String,
        /// Debit minus credit of the party after the posting.
        outstanding: Decimal,
        /// Configured limit.
        credit_limit: Decimal,
    },

    // ========== Outstanding ==========
    /// Outstanding would fall below zero.
    #[error("Outstanding for {voucher} (party {party:?}) cannot be negative: {outstanding}")]
    OutstandingNegative {
        /// Referenced document.
        voucher: VoucherKey,
        /// Party.
        party: Option<String>,
        /// Computed outstanding.
        outstanding: Decimal,
    },

    // ========== Concurrency ==========
    /// Locks stayed contended through every attempt.
    #[error("Could not acquire ledger locks after {attempts} attempts, please retry")]
    LockContention {
        /// Attempts made.
        attempts: u32,
    },

    // ========== Lookup ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Voucher not registered.
    #[error("{0} not found")]
    VoucherNotFound(VoucherKey),

    /// Referenced document is not submitted.
    #[error("{0} is not submitted")]
    TargetNotSubmitted(VoucherKey),

    // ========== State ==========
    /// Status does not allow the action.
    #[error("Cannot {action} {voucher} in status {from}")]
    InvalidTransition {
        /// The voucher.
        voucher: VoucherKey,
        /// Current status.
        from: DocStatus,
        /// Attempted action.
        action: &'static str,
    },

    /// Original already has a live amendment, or the amendment link is wrong.
    #[error("{voucher} cannot be amended by {amendment}")]
    AmendmentConflict {
        /// The original voucher.
        voucher: VoucherKey,
        /// The competing amendment number.
        amendment: String,
    },
}

impl LedgerError {
    /// Creates an `InvalidVoucher` error.
    pub fn invalid(voucher: &VoucherKey, reason: impl Into<String>) -> Self {
        Self::InvalidVoucher {
            voucher: voucher.clone(),
            reason: reason.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField { .. }
            | Self::ZeroAmount { .. }
            | Self::BothDebitAndCredit { .. }
            | Self::NegativeAmount { .. }
            | Self::CostCenterRequired { .. }
            | Self::UnknownCostCenter(_)
            | Self::CostCenterCompanyMismatch { .. }
            | Self::OpeningOnProfitAndLoss { .. }
            | Self::AccountCompanyMismatch { .. }
            | Self::UnknownFiscalYear(_)
            | Self::PostingDateOutsideFiscalYear { .. }
            | Self::InvalidMasterData { .. }
            | Self::NoEntries(_)
            | Self::Unbalanced { .. }
            | Self::InvalidVoucher { .. }
            | Self::GrandTotalMismatch { .. }
            | Self::StaleAllocation { .. }
            | Self::DuplicateBillNo { .. } => ErrorKind::Validation,
            Self::GroupAccountPosting { .. }
            | Self::AccountDisabled { .. }
            | Self::PartyDisabled(_)
            | Self::BalanceTypeViolation { .. } => ErrorKind::Invariant,
            Self::Account(err) => err.kind(),
            Self::FrozenPeriod { .. }
            | Self::FrozenAccount { .. }
            | Self::CreditDaysExceeded { .. }
            | Self::CreditLimitExceeded { .. } => ErrorKind::Authorization,
            Self::OutstandingNegative { .. } => ErrorKind::OutstandingNegative,
            Self::LockContention { .. } => ErrorKind::Transient,
            Self::AccountNotFound(_) | Self::VoucherNotFound(_) => ErrorKind::NotFound,
            Self::TargetNotSubmitted(_)
            | Self::InvalidTransition { .. }
            | Self::AmendmentConflict { .. } => ErrorKind::State,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::ZeroAmount { .. } => "ZERO_AMOUNT",
            Self::BothDebitAndCredit { .. } => "BOTH_DEBIT_AND_CREDIT",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::CostCenterRequired { .. } => "COST_CENTER_REQUIRED",
            Self::UnknownCostCenter(_) => "UNKNOWN_COST_CENTER",
            Self::CostCenterCompanyMismatch { .. } => "COST_CENTER_COMPANY_MISMATCH",
            Self::OpeningOnProfitAndLoss { .. } => "OPENING_ON_PROFIT_AND_LOSS",
            Self::AccountCompanyMismatch { .. } => "ACCOUNT_COMPANY_MISMATCH",
            Self::UnknownFiscalYear(_) => "UNKNOWN_FISCAL_YEAR",
            Self::PostingDateOutsideFiscalYear { .. } => "POSTING_DATE_OUTSIDE_FISCAL_YEAR",
            Self::InvalidMasterData { .. } => "INVALID_MASTER_DATA",
            Self::NoEntries(_) => "NO_ENTRIES",
            Self::Unbalanced { .. } => "UNBALANCED",
            Self::InvalidVoucher { .. } => "INVALID_VOUCHER",
            Self::GrandTotalMismatch { .. } => "GRAND_TOTAL_MISMATCH",
            Self::StaleAllocation { .. } => "STALE_ALLOCATION",
            Self::DuplicateBillNo { .. } => "DUPLICATE_BILL_NO",
            Self::GroupAccountPosting { .. } => "GROUP_ACCOUNT_POSTING",
            Self::AccountDisabled { .. } => "ACCOUNT_DISABLED",
            Self::PartyDisabled(_) => "PARTY_DISABLED",
            Self::BalanceTypeViolation { .. } => "BALANCE_TYPE_VIOLATION",
            Self::Account(err) => err.error_code(),
            Self::FrozenPeriod { .. } => "FROZEN_PERIOD",
            Self::FrozenAccount { .. } => "FROZEN_ACCOUNT",
            Self::CreditDaysExceeded { .. } => "CREDIT_DAYS_EXCEEDED",
            Self::CreditLimitExceeded { .. } => "CREDIT_LIMIT_EXCEEDED",
            Self::OutstandingNegative { .. } => "OUTSTANDING_NEGATIVE",
            Self::LockContention { .. } => "LOCK_CONTENTION",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::VoucherNotFound(_) => "VOUCHER_NOT_FOUND",
            Self::TargetNotSubmitted(_) => "TARGET_NOT_SUBMITTED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::AmendmentConflict { .. } => "AMENDMENT_CONFLICT",
        }
    }

    /// Returns the identifier of the offending account, voucher or master record.
    #[must_use]
    pub fn entity(&self) -> String {
        match self {
            Self::MissingField { field } => (*field).to_string(),
            Self::ZeroAmount { account }
            | Self::BothDebitAndCredit { account }
            | Self::NegativeAmount { account }
            | Self::CostCenterRequired { account }
            | Self::OpeningOnProfitAndLoss { account }
            | Self::AccountCompanyMismatch { account, .. }
            | Self::GroupAccountPosting { account }
            | Self::AccountDisabled { account }
            | Self::BalanceTypeViolation { account, .. }
            | Self::FrozenAccount { account } => account.clone(),
            Self::UnknownCostCenter(name)
            | Self::UnknownFiscalYear(name)
            | Self::PartyDisabled(name)
            | Self::CreditDaysExceeded { party: name, .. }
            | Self::CreditLimitExceeded { party: name, .. }
            | Self::CostCenterCompanyMismatch {
                cost_center: name, ..
            }
            | Self::PostingDateOutsideFiscalYear {
                fiscal_year: name, ..
            }
            | Self::InvalidMasterData { name, .. } => name.clone(),
            Self::NoEntries(voucher)
            | Self::VoucherNotFound(voucher)
            | Self::TargetNotSubmitted(voucher)
            | Self::Unbalanced { voucher, .. }
            | Self::InvalidVoucher { voucher, .. }
            | Self::GrandTotalMismatch { voucher, .. }
            | Self::StaleAllocation { voucher, .. }
            | Self::DuplicateBillNo { voucher, .. }
            | Self::OutstandingNegative { voucher, .. }
            | Self::InvalidTransition { voucher, .. }
            | Self::AmendmentConflict { voucher, .. } => voucher.voucher_no.clone(),
            Self::Account(err) => err.entity(),
            Self::FrozenPeriod { date, .. } => date.to_string(),
            Self::LockContention { .. } => String::new(),
            Self::AccountNotFound(id) => id.to_string(),
        }
    }

    /// Returns true if retrying the whole call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
