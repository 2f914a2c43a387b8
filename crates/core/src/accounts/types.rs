//! Chart-of-accounts node types.

use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

/// Which financial statement an account reports into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Assets, liabilities and equity. Balances carry across years.
    BalanceSheet,
    /// Income and expense. Balances are closed at year end.
    ProfitAndLoss,
}

/// Functional classification of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Customer receivables.
    Receivable,
    /// Supplier payables.
    Payable,
    /// Bank accounts.
    Bank,
    /// Cash in hand.
    Cash,
    /// Expense accounts.
    Expense,
    /// Income accounts.
    Income,
    /// Fixed assets.
    FixedAsset,
    /// Stock-in-hand.
    Warehouse,
    /// Duties and taxes.
    Tax,
    /// Owner's equity.
    Equity,
    /// Expenses that can be charged to items.
    ChargeableExpense,
    /// Anything else.
    Other,
}

/// Side on which an account's balance naturally grows.
///
/// Assets and expenses grow with debits; liabilities, equity and income with credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Balance = debit - credit.
    #[default]
    Debit,
    /// Balance = credit - debit.
    Credit,
}

/// Sign an account's raw balance (debit - credit) must keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceMustBe {
    /// Debit minus credit must stay >= 0.
    Debit,
    /// Debit minus credit must stay <= 0.
    Credit,
}

/// A node of the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable arena key.
    pub id: AccountId,
    /// Name, unique within the company.
    pub name: String,
    /// Parent group, `None` for roots.
    pub parent: Option<AccountId>,
    /// Owning company.
    pub company: String,
    /// Groups aggregate children and never take postings.
    pub is_group: bool,
    /// Statement the account reports into.
    pub report_type: ReportType,
    /// Functional classification.
    pub account_type: Option<AccountType>,
    /// Side the balance grows on.
    pub normal_balance: NormalBalance,
    /// Frozen accounts only take postings from the modifier role.
    pub frozen: bool,
    /// Disabled accounts take no postings at all.
    pub disabled: bool,
    /// Optional sign constraint on the running balance.
    pub balance_must_be: Option<BalanceMustBe>,
    /// Nested-set left bound.
    pub lft: u32,
    /// Nested-set right bound.
    pub rgt: u32,
}

impl Account {
    /// Returns true if this account has no parent.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns true if entries may be posted here (ignoring frozen checks).
    #[must_use]
    pub const fn is_postable(&self) -> bool {
        !self.is_group && !self.disabled
    }

    /// Returns true if `other` lies strictly inside this node's nested-set range.
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        other.lft > self.lft && other.rgt < self.rgt
    }

    /// Converts a raw debit-minus-credit amount to this account's natural sign.
    #[must_use]
    pub fn natural_sign(&self, raw: rust_decimal::Decimal) -> rust_decimal::Decimal {
        match self.normal_balance {
            NormalBalance::Debit => raw,
            NormalBalance::Credit => -raw,
        }
    }
}

/// Input for creating an account.
///
/// `report_type` and `normal_balance` are taken from the parent when it has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    /// Account name.
    pub name: String,
    /// Owning company.
    pub company: String,
    /// Parent group.
    pub parent: Option<AccountId>,
    /// Group or ledger.
    pub is_group: bool,
    /// Statement, required for roots.
    pub report_type: Option<ReportType>,
    /// Functional classification.
    pub account_type: Option<AccountType>,
    /// Natural side, only read for roots.
    pub normal_balance: Option<NormalBalance>,
    /// Sign constraint.
    pub balance_must_be: Option<BalanceMustBe>,
    /// Start frozen.
    pub frozen: bool,
}

impl NewAccount {
    /// Starts a group account.
    pub fn group(name: impl Into<String>, company: impl Into<String>) -> Self {
        Self::new(name, company, true)
    }

    /// Starts a ledger (leaf) account.
    pub fn ledger(name: impl Into<String>, company: impl Into<String>) -> Self {
        Self::new(name, company, false)
    }

    fn new(name: impl Into<String>, company: impl Into<String>, is_group: bool) -> Self {
        Self {
            name: name.into(),
            company: company.into(),
            parent: None,
            is_group,
            report_type: None,
            account_type: None,
            normal_balance: None,
            balance_must_be: None,
            frozen: false,
        }
    }

    /// Sets the parent group.
    #[must_use]
    pub const fn under(mut self, parent: AccountId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the report type.
    #[must_use]
    pub const fn report_type(mut self, report_type: ReportType) -> Self {
        self.report_type = Some(report_type);
        self
    }

    /// Sets the account type.
    #[must_use]
    pub const fn account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    /// Sets the natural balance side of a root.
    #[must_use]
    pub const fn normal_balance(mut self, normal_balance: NormalBalance) -> Self {
        self.normal_balance = Some(normal_balance);
        self
    }

    /// Sets the balance sign constraint.
    #[must_use]
    pub const fn balance_must_be(mut self, sign: BalanceMustBe) -> Self {
        self.balance_must_be = Some(sign);
        self
    }

    /// Creates the account frozen.
    #[must_use]
    pub const fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }
}

/// Result of [`rename`](super::AccountTree::rename).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The account kept its id and took the new name.
    Renamed(AccountId),
    /// The account was folded into an existing account of that name.
    Merged {
        /// The removed account.
        from: AccountId,
        /// The surviving account.
        into: AccountId,
    },
}
