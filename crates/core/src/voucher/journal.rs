//! Journal vouchers: payments, receipts and manual adjustments.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, DebitCredit};
use tracing::warn;

use super::{PostingContext, Postable, VoucherHeader};
use crate::accounts::AccountType;
use crate::ledger::entry::{EntryDraft, EntryHeader};
use crate::ledger::error::LedgerError;
use crate::ledger::types::{DocStatus, VoucherKey, VoucherType};
use crate::masters::MasterData;

/// Journal voucher flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalKind {
    /// General adjustment.
    #[default]
    JournalEntry,
    /// Bank payment or receipt. Needs a reference number and date.
    BankEntry,
    /// Cash payment or receipt.
    CashEntry,
    /// Transfer between cash and bank accounts.
    ContraEntry,
    /// Write-off of outstanding amounts.
    WriteOffEntry,
    /// Opening balances.
    OpeningEntry,
}

/// One line of a journal voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Account.
    pub account: AccountId,
    /// Party.
    pub party: Option<String>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Cost center, for P&L accounts.
    pub cost_center: Option<String>,
    /// Invoice or journal voucher this line settles.
    pub against: Option<VoucherKey>,
    /// Marks an advance that will be allocated to invoices later.
    pub is_advance: bool,
}

impl JournalLine {
    /// A debit line.
    #[must_use]
    pub const fn debit(account: AccountId, amount: Decimal) -> Self {
        Self::new(account, amount, Decimal::ZERO)
    }

    /// A credit line.
    #[must_use]
    pub const fn credit(account: AccountId, amount: Decimal) -> Self {
        Self::new(account, Decimal::ZERO, amount)
    }

    const fn new(account: AccountId, debit: Decimal, credit: Decimal) -> Self {
        Self {
            account,
            party: None,
            debit,
            credit,
            cost_center: None,
            against: None,
            is_advance: false,
        }
    }

    /// Sets the party.
    #[must_use]
    pub fn party(mut self, party: impl Into<String>) -> Self {
        self.party = Some(party.into());
        self
    }

    /// Sets the cost center.
    #[must_use]
    pub fn cost_center(mut self, cost_center: impl Into<String>) -> Self {
        self.cost_center = Some(cost_center.into());
        self
    }

    /// Links the line to a document.
    #[must_use]
    pub fn against(mut self, against: VoucherKey) -> Self {
        self.against = Some(against);
        self
    }

    /// Marks the line as an advance.
    #[must_use]
    pub const fn advance(mut self) -> Self {
        self.is_advance = true;
        self
    }

    /// The non-zero amount of the line.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        if self.debit.is_zero() {
            self.credit
        } else {
            self.debit
        }
    }

    /// Debit and credit as a pair.
    #[must_use]
    pub const fn amounts(&self) -> DebitCredit {
        DebitCredit::new(self.debit, self.credit)
    }
}

/// A journal voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalVoucher {
    /// Common header.
    pub header: VoucherHeader,
    /// Flavour.
    pub kind: JournalKind,
    /// Cheque or transfer reference.
    pub cheque_no: Option<String>,
    /// Reference date.
    pub cheque_date: Option<NaiveDate>,
    /// Free-text remark.
    pub user_remark: Option<String>,
    /// Lines, in order.
    pub lines: Vec<JournalLine>,
}

impl JournalVoucher {
    /// Creates a journal voucher.
    #[must_use]
    pub fn new(header: VoucherHeader, lines: Vec<JournalLine>) -> Self {
        Self {
            header,
            kind: JournalKind::JournalEntry,
            cheque_no: None,
            cheque_date: None,
            user_remark: None,
            lines,
        }
    }

    /// Sets the flavour.
    #[must_use]
    pub const fn kind(mut self, kind: JournalKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the user remark.
    #[must_use]
    pub fn user_remark(mut self, remark: impl Into<String>) -> Self {
        self.user_remark = Some(remark.into());
        self
    }

    /// Sets the cheque reference.
    #[must_use]
    pub fn cheque(mut self, no: impl Into<String>, date: NaiveDate) -> Self {
        self.cheque_no = Some(no.into());
        self.cheque_date = Some(date);
        self
    }

    /// Rejects a reference date further past the posting date than a
    /// party's credit days allow, unless `authorized`.
    ///
    /// Only bank, contra and general journal entries are checked.
    ///
    /// # Errors
    ///
    /// `CreditDaysExceeded` for the first party over its allowance.
    pub fn check_credit_days(&self, masters: &MasterData, authorized: bool) -> Result<(), LedgerError> {
        let checked = matches!(
            self.kind,
            JournalKind::BankEntry | JournalKind::ContraEntry | JournalKind::JournalEntry
        );
        let Some(cheque_date) = self.cheque_date.filter(|_| checked && !authorized) else {
            return Ok(());
        };
        let days = (cheque_date - self.header.posting_date).num_days();
        if days <= 0 {
            return Ok(());
        }
        for party in self.lines.iter().filter_map(|l| l.party.as_deref()) {
            let credit_days = masters.credit_days(party, &self.header.company);
            if credit_days > 0 && days > i64::from(credit_days) {
                return Err(LedgerError::CreditDaysExceeded {
                    party: party.to_string(),
                    credit_days,
                    days,
                });
            }
        }
        Ok(())
    }

    fn validate_cheque_info(&self) -> Result<(), LedgerError> {
        let key = self.key();
        let has_no = self.cheque_no.as_deref().is_some_and(|n| !n.trim().is_empty());
        if self.kind == JournalKind::BankEntry && (!has_no || self.cheque_date.is_none()) {
            return Err(LedgerError::invalid(
                &key,
                "Reference No & Reference Date is required for Bank Entry",
            ));
        }
        if self.cheque_date.is_some() && !has_no {
            return Err(LedgerError::invalid(
                &key,
                "Reference No is mandatory if you entered Reference Date",
            ));
        }
        if has_no && self.cheque_date.is_none() {
            return Err(LedgerError::invalid(&key, "Please enter Reference Date"));
        }
        Ok(())
    }

    fn validate_against(
        &self,
        line: &JournalLine,
        against: &VoucherKey,
        ctx: &dyn PostingContext,
    ) -> Result<(), LedgerError> {
        let key = self.key();
        if against == &key {
            return Err(LedgerError::invalid(
                &key,
                "You can not enter current voucher in 'Against JV' column",
            ));
        }
        let target = ctx
            .document(against)
            .ok_or_else(|| LedgerError::VoucherNotFound(against.clone()))?;
        if target.status != DocStatus::Submitted {
            return Err(LedgerError::TargetNotSubmitted(against.clone()));
        }

        match against.voucher_type {
            VoucherType::JournalVoucher => {
                let has_line = target
                    .voucher
                    .as_journal()
                    .is_some_and(|jv| jv.lines.iter().any(|l| l.account == line.account));
                if !has_line {
                    return Err(LedgerError::invalid(
                        &key,
                        format!("Against JV: {} is not valid", against.voucher_no),
                    ));
                }
            }
            VoucherType::SalesInvoice | VoucherType::PurchaseInvoice => {
                if target.voucher.party() != line.party.as_deref() {
                    return Err(LedgerError::invalid(
                        &key,
                        format!(
                            "Party is not matching with Party in {}",
                            against.voucher_no
                        ),
                    ));
                }
                if target.voucher.party_account() != Some(line.account) {
                    return Err(LedgerError::invalid(
                        &key,
                        format!(
                            "Account does not match the party account of {}",
                            against.voucher_no
                        ),
                    ));
                }
            }
            VoucherType::PeriodClosingVoucher => {
                return Err(LedgerError::invalid(
                    &key,
                    "Lines cannot reference a Period Closing Voucher",
                ));
            }
        }
        Ok(())
    }

    /// Logs a warning for party lines that look like unmarked advances.
    fn check_advance_flags(&self, ctx: &dyn PostingContext) {
        for line in &self.lines {
            if line.party.is_none() || line.is_advance || line.against.is_some() {
                continue;
            }
            let Ok(account) = ctx.account(line.account) else {
                continue;
            };
            let looks_like_advance = match account.account_type {
                Some(AccountType::Receivable) => line.credit > Decimal::ZERO,
                Some(AccountType::Payable) => line.debit > Decimal::ZERO,
                _ => false,
            };
            if looks_like_advance {
                warn!(
                    voucher_no = %self.header.voucher_no,
                    account = %account.name,
                    "Please check 'Is Advance' against the account if this is an advance entry"
                );
            }
        }
    }
}

impl Postable for JournalVoucher {
    fn header(&self) -> &VoucherHeader {
        &self.header
    }

    fn voucher_type(&self) -> VoucherType {
        VoucherType::JournalVoucher
    }

    fn validate(&self, ctx: &dyn PostingContext) -> Result<(), LedgerError> {
        for line in &self.lines {
            if !line.debit.is_zero() && !line.credit.is_zero() {
                let account = ctx.account(line.account)?;
                return Err(LedgerError::BothDebitAndCredit {
                    account: account.name,
                });
            }
        }
        self.validate_cheque_info()?;
        for line in &self.lines {
            if let Some(against) = &line.against {
                self.validate_against(line, against, ctx)?;
            }
        }
        if self.remarks().is_empty() {
            return Err(LedgerError::MissingField {
                field: "user_remark",
            });
        }
        self.check_advance_flags(ctx);
        Ok(())
    }

    fn gl_entries(&self, _ctx: &dyn PostingContext) -> Result<Vec<EntryDraft>, LedgerError> {
        Ok(self
            .lines
            .iter()
            .map(|line| {
                EntryDraft::new(line.account, line.amounts())
                    .party(line.party.clone())
                    .against(line.against.clone())
                    .cost_center(line.cost_center.clone())
            })
            .collect())
    }

    /// Reference, settled invoices and the user remark, one per line.
    fn remarks(&self) -> String {
        let mut parts = Vec::new();
        if let (Some(no), Some(date)) = (&self.cheque_no, self.cheque_date) {
            parts.push(format!("Via Reference #{no} dated {}", date.format("%d-%m-%Y")));
        }
        for line in &self.lines {
            match &line.against {
                Some(inv) if inv.voucher_type == VoucherType::SalesInvoice && !line.credit.is_zero() => {
                    parts.push(format!("{} against Invoice: {}", line.credit, inv.voucher_no));
                }
                Some(bill) if bill.voucher_type == VoucherType::PurchaseInvoice && !line.debit.is_zero() => {
                    parts.push(format!("{} against Bill {}", line.debit, bill.voucher_no));
                }
                _ => {}
            }
        }
        if let Some(remark) = self.user_remark.as_deref().filter(|r| !r.trim().is_empty()) {
            parts.push(format!("User Remark : {remark}"));
        }
        parts.join("\n")
    }

    fn entry_header(&self) -> EntryHeader {
        let mut header = EntryHeader {
            voucher: self.key(),
            company: self.header.company.clone(),
            posting_date: self.header.posting_date,
            fiscal_year: self.header.fiscal_year.clone(),
            remarks: self.remarks(),
            is_opening: self.header.is_opening,
        };
        if self.kind == JournalKind::OpeningEntry {
            header.is_opening = true;
        }
        header
    }
}
