//! Ledger entry domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, DebitCredit, EntryId};

use super::types::VoucherKey;

/// Fields shared by every row a voucher posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryHeader {
    /// The posting voucher.
    pub voucher: VoucherKey,
    /// Company of the voucher.
    pub company: String,
    /// Posting date.
    pub posting_date: NaiveDate,
    /// Fiscal year name.
    pub fiscal_year: String,
    /// Default remarks for rows that carry none.
    pub remarks: String,
    /// Opening-balance voucher.
    pub is_opening: bool,
}

/// A candidate row produced by a voucher before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    /// Target account.
    pub account: AccountId,
    /// Party (customer or supplier name).
    pub party: Option<String>,
    /// Document this row settles or belongs to.
    pub against: Option<VoucherKey>,
    /// Amounts, exactly one side non-zero.
    pub amount: DebitCredit,
    /// Cost center for P&L rows.
    pub cost_center: Option<String>,
    /// Row-level remarks, overriding the header.
    pub remarks: Option<String>,
}

impl EntryDraft {
    /// A debit row.
    #[must_use]
    pub const fn debit(account: AccountId, amount: Decimal) -> Self {
        Self::new(account, DebitCredit::debit(amount))
    }

    /// A credit row.
    #[must_use]
    pub const fn credit(account: AccountId, amount: Decimal) -> Self {
        Self::new(account, DebitCredit::credit(amount))
    }

    /// A row with explicit amounts.
    #[must_use]
    pub const fn new(account: AccountId, amount: DebitCredit) -> Self {
        Self {
            account,
            party: None,
            against: None,
            amount,
            cost_center: None,
            remarks: None,
        }
    }

    /// Sets the party.
    #[must_use]
    pub fn party(mut self, party: Option<String>) -> Self {
        self.party = party;
        self
    }

    /// Sets the against-voucher.
    #[must_use]
    pub fn against(mut self, against: Option<VoucherKey>) -> Self {
        self.against = against;
        self
    }

    /// Sets the cost center.
    #[must_use]
    pub fn cost_center(mut self, cost_center: Option<String>) -> Self {
        self.cost_center = cost_center;
        self
    }

    /// Returns true if this row could be merged with `other`.
    #[must_use]
    pub fn merges_with(&self, other: &Self) -> bool {
        self.account == other.account
            && self.cost_center == other.cost_center
            && self.against == other.against
            && self.party == other.party
    }
}

/// An immutable row of the general ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier.
    pub id: EntryId,
    /// Position in the append-only log, assigned on commit.
    pub seq: u64,
    /// Account posted to.
    pub account: AccountId,
    /// Company.
    pub company: String,
    /// Posting date.
    pub posting_date: NaiveDate,
    /// Fiscal year name.
    pub fiscal_year: String,
    /// The posting voucher.
    pub voucher: VoucherKey,
    /// Document this row settles or belongs to.
    pub against: Option<VoucherKey>,
    /// Party.
    pub party: Option<String>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Cost center.
    pub cost_center: Option<String>,
    /// Remarks.
    pub remarks: String,
    /// Opening-balance row.
    pub is_opening: bool,
    /// The row this one mirrors, for reversal rows.
    pub reverses: Option<EntryId>,
}

impl LedgerEntry {
    /// Combines a header and a draft into an unsequenced row.
    #[must_use]
    pub fn from_draft(header: &EntryHeader, draft: EntryDraft) -> Self {
        Self {
            id: EntryId::new(),
            seq: 0,
            account: draft.account,
            company: header.company.clone(),
            posting_date: header.posting_date,
            fiscal_year: header.fiscal_year.clone(),
            voucher: header.voucher.clone(),
            against: draft.against,
            party: draft.party,
            debit: draft.amount.debit,
            credit: draft.amount.credit,
            cost_center: draft.cost_center,
            remarks: draft.remarks.unwrap_or_else(|| header.remarks.clone()),
            is_opening: header.is_opening,
            reverses: None,
        }
    }

    /// Debit and credit as a pair.
    #[must_use]
    pub const fn amount(&self) -> DebitCredit {
        DebitCredit::new(self.debit, self.credit)
    }

    /// Signed amount, debit minus credit.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Returns true if this row reverses another.
    #[must_use]
    pub const fn is_reversal(&self) -> bool {
        self.reverses.is_some()
    }
}
