//! Business documents that post to the general ledger.
//!
//! [`Voucher`] is a closed set of variants. Each variant implements
//! [`Postable`]: its own validation plus the candidate rows it posts.
//! Everything a variant needs to look up goes through [`PostingContext`],
//! so variants stay free of locking and storage concerns.

pub mod closing;
pub mod invoice;
pub mod journal;
pub mod state;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, DebitCredit};

use crate::accounts::Account;
use crate::ledger::entry::{EntryDraft, EntryHeader};
use crate::ledger::error::LedgerError;
use crate::ledger::types::{DocStatus, VoucherKey, VoucherType};

pub use closing::PeriodClosingVoucher;
pub use invoice::{
    AdvanceAllocation, InvoiceItem, PosPayment, PurchaseInvoice, SalesInvoice, TaxEffect, TaxLine,
    WriteOff,
};
pub use journal::{JournalKind, JournalLine, JournalVoucher};
pub use state::{CancelAction, VoucherWorkflow};

/// Fields common to every voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherHeader {
    /// Document number.
    pub voucher_no: String,
    /// Company.
    pub company: String,
    /// Posting date.
    pub posting_date: NaiveDate,
    /// Fiscal year name.
    pub fiscal_year: String,
    /// Document status.
    pub docstatus: DocStatus,
    /// Cancelled voucher this one amends.
    pub amended_from: Option<String>,
    /// Free-text remarks.
    pub remarks: Option<String>,
    /// Opening-balance document.
    pub is_opening: bool,
}

impl VoucherHeader {
    /// A draft header.
    pub fn new(
        voucher_no: impl Into<String>,
        company: impl Into<String>,
        posting_date: NaiveDate,
        fiscal_year: impl Into<String>,
    ) -> Self {
        Self {
            voucher_no: voucher_no.into(),
            company: company.into(),
            posting_date,
            fiscal_year: fiscal_year.into(),
            docstatus: DocStatus::Draft,
            amended_from: None,
            remarks: None,
            is_opening: false,
        }
    }

    /// Sets the remarks.
    #[must_use]
    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }
}

/// A registered voucher as seen by validation of another voucher.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    /// Current status.
    pub status: DocStatus,
    /// The voucher as last stored.
    pub voucher: Voucher,
}

/// Read access to the state a voucher is validated against.
pub trait PostingContext {
    /// Looks up an account.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if no such account exists.
    fn account(&self, id: AccountId) -> Result<Account, LedgerError>;

    /// Looks up a registered voucher.
    fn document(&self, key: &VoucherKey) -> Option<DocumentSnapshot>;

    /// Leaf accounts of a company.
    fn ledger_accounts(&self, company: &str) -> Vec<Account>;

    /// Raw balance (debit - credit) of an account as of a date.
    fn account_net(&self, id: AccountId, as_of: NaiveDate) -> Decimal;

    /// Every submitted voucher of a type.
    fn submitted(&self, voucher_type: VoucherType) -> Vec<Voucher>;
}

/// Posting capability shared by all voucher variants.
pub trait Postable {
    /// Common header.
    fn header(&self) -> &VoucherHeader;

    /// Variant tag.
    fn voucher_type(&self) -> VoucherType;

    /// Variant-specific checks run before rows are built.
    ///
    /// # Errors
    ///
    /// Any [`LedgerError`] describing the first failed rule.
    fn validate(&self, ctx: &dyn PostingContext) -> Result<(), LedgerError>;

    /// Candidate rows this voucher posts.
    ///
    /// # Errors
    ///
    /// Lookup failures from the context.
    fn gl_entries(&self, ctx: &dyn PostingContext) -> Result<Vec<EntryDraft>, LedgerError>;

    /// Remarks stamped on rows.
    fn remarks(&self) -> String {
        self.header()
            .remarks
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "No Remarks".to_string())
    }

    /// Identity of the voucher.
    fn key(&self) -> VoucherKey {
        VoucherKey::new(self.voucher_type(), self.header().voucher_no.clone())
    }

    /// Header shared by the rows this voucher posts.
    fn entry_header(&self) -> EntryHeader {
        let header = self.header();
        EntryHeader {
            voucher: self.key(),
            company: header.company.clone(),
            posting_date: header.posting_date,
            fiscal_year: header.fiscal_year.clone(),
            remarks: self.remarks(),
            is_opening: header.is_opening,
        }
    }
}

/// Any document that posts to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "voucher_type", rename_all = "snake_case")]
pub enum Voucher {
    /// Journal voucher.
    Journal(JournalVoucher),
    /// Sales invoice.
    SalesInvoice(SalesInvoice),
    /// Purchase invoice.
    PurchaseInvoice(PurchaseInvoice),
    /// Period closing voucher.
    PeriodClosing(PeriodClosingVoucher),
}

impl Voucher {
    /// The variant as a [`Postable`].
    #[must_use]
    pub fn postable(&self) -> &dyn Postable {
        match self {
            Self::Journal(v) => v,
            Self::SalesInvoice(v) => v,
            Self::PurchaseInvoice(v) => v,
            Self::PeriodClosing(v) => v,
        }
    }

    /// Mutable access to the header.
    pub fn header_mut(&mut self) -> &mut VoucherHeader {
        match self {
            Self::Journal(v) => &mut v.header,
            Self::SalesInvoice(v) => &mut v.header,
            Self::PurchaseInvoice(v) => &mut v.header,
            Self::PeriodClosing(v) => &mut v.header,
        }
    }

    /// Common header.
    #[must_use]
    pub fn header(&self) -> &VoucherHeader {
        self.postable().header()
    }

    /// Identity of the voucher.
    #[must_use]
    pub fn key(&self) -> VoucherKey {
        self.postable().key()
    }

    /// Variant tag.
    #[must_use]
    pub fn voucher_type(&self) -> VoucherType {
        self.postable().voucher_type()
    }

    /// The invoice party, for invoices.
    #[must_use]
    pub fn party(&self) -> Option<&str> {
        match self {
            Self::SalesInvoice(v) => Some(&v.customer),
            Self::PurchaseInvoice(v) => Some(&v.supplier),
            Self::Journal(_) | Self::PeriodClosing(_) => None,
        }
    }

    /// The receivable or payable account, for invoices.
    #[must_use]
    pub fn party_account(&self) -> Option<AccountId> {
        match self {
            Self::SalesInvoice(v) => Some(v.debit_to),
            Self::PurchaseInvoice(v) => Some(v.credit_to),
            Self::Journal(_) | Self::PeriodClosing(_) => None,
        }
    }

    /// Advance allocations listed on an invoice.
    #[must_use]
    pub fn advances(&self) -> &[AdvanceAllocation] {
        match self {
            Self::SalesInvoice(v) => &v.advances,
            Self::PurchaseInvoice(v) => &v.advances,
            Self::Journal(_) | Self::PeriodClosing(_) => &[],
        }
    }

    /// The journal voucher, if this is one.
    #[must_use]
    pub const fn as_journal(&self) -> Option<&JournalVoucher> {
        match self {
            Self::Journal(v) => Some(v),
            _ => None,
        }
    }

    /// Points every reference to `from` at `into`, after two accounts merge.
    pub fn reassign_account(&mut self, from: AccountId, into: AccountId) {
        let swap = |account: &mut AccountId| {
            if *account == from {
                *account = into;
            }
        };
        match self {
            Self::Journal(v) => v.lines.iter_mut().for_each(|l| swap(&mut l.account)),
            Self::SalesInvoice(v) => {
                swap(&mut v.debit_to);
                v.items.iter_mut().for_each(|i| swap(&mut i.account));
                v.taxes.iter_mut().for_each(|t| swap(&mut t.account));
                if let Some(pos) = &mut v.pos {
                    swap(&mut pos.cash_bank_account);
                    if let Some(w) = &mut pos.write_off {
                        swap(&mut w.account);
                    }
                }
            }
            Self::PurchaseInvoice(v) => {
                swap(&mut v.credit_to);
                v.items.iter_mut().for_each(|i| swap(&mut i.account));
                v.taxes.iter_mut().for_each(|t| swap(&mut t.account));
                if let Some(w) = &mut v.write_off {
                    swap(&mut w.account);
                }
            }
            Self::PeriodClosing(v) => swap(&mut v.closing_account),
        }
    }
}

impl From<JournalVoucher> for Voucher {
    fn from(v: JournalVoucher) -> Self {
        Self::Journal(v)
    }
}

impl From<SalesInvoice> for Voucher {
    fn from(v: SalesInvoice) -> Self {
        Self::SalesInvoice(v)
    }
}

impl From<PurchaseInvoice> for Voucher {
    fn from(v: PurchaseInvoice) -> Self {
        Self::PurchaseInvoice(v)
    }
}

impl From<PeriodClosingVoucher> for Voucher {
    fn from(v: PeriodClosingVoucher) -> Self {
        Self::PeriodClosing(v)
    }
}

/// Sums rows with identical account, cost center, against-voucher and party.
///
/// A merged row that ends up with both sides is netted to one side; rows
/// netting to zero are dropped.
#[must_use]
pub fn merge_similar_entries(drafts: Vec<EntryDraft>) -> Vec<EntryDraft> {
    let mut merged: Vec<EntryDraft> = Vec::with_capacity(drafts.len());
    for draft in drafts {
        match merged.iter_mut().find(|m| m.merges_with(&draft)) {
            Some(existing) => existing.amount += draft.amount,
            None => merged.push(draft),
        }
    }
    merged
        .into_iter()
        .filter_map(|mut draft| {
            let net = draft.amount.net();
            if net.is_zero() {
                return None;
            }
            draft.amount = DebitCredit::from_net(net);
            Some(draft)
        })
        .collect()
}
