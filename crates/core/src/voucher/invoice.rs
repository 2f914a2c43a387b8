//! Sales and purchase invoices.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, round_amount};

use super::{PostingContext, Postable, Voucher, VoucherHeader, merge_similar_entries};
use crate::accounts::ReportType;
use crate::ledger::entry::EntryDraft;
use crate::ledger::error::LedgerError;
use crate::ledger::types::{VoucherKey, VoucherType};

/// An income or expense line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    /// Income (sales) or expense (purchase) account.
    pub account: AccountId,
    /// Line amount.
    pub amount: Decimal,
    /// Cost center.
    pub cost_center: Option<String>,
}

/// Whether a tax increases or reduces the invoice total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxEffect {
    /// Added to the total.
    #[default]
    Add,
    /// Deducted from the total (withholding).
    Deduct,
}

/// A tax or charge line. Amounts are computed upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLine {
    /// Tax account.
    pub account: AccountId,
    /// Tax amount.
    pub amount: Decimal,
    /// Cost center, for P&L tax accounts.
    pub cost_center: Option<String>,
    /// Add or deduct.
    pub effect: TaxEffect,
}

impl TaxLine {
    /// An added tax.
    #[must_use]
    pub const fn add(account: AccountId, amount: Decimal) -> Self {
        Self {
            account,
            amount,
            cost_center: None,
            effect: TaxEffect::Add,
        }
    }

    /// A deducted tax.
    #[must_use]
    pub const fn deduct(account: AccountId, amount: Decimal) -> Self {
        Self {
            account,
            amount,
            cost_center: None,
            effect: TaxEffect::Deduct,
        }
    }

    fn signed(&self) -> Decimal {
        match self.effect {
            TaxEffect::Add => self.amount,
            TaxEffect::Deduct => -self.amount,
        }
    }
}

/// Amount written off against an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOff {
    /// Write-off account.
    pub account: AccountId,
    /// Amount written off.
    pub amount: Decimal,
    /// Cost center, for P&L write-off accounts.
    pub cost_center: Option<String>,
}

/// Payment collected at the point of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosPayment {
    /// Cash or bank account receiving the payment.
    pub cash_bank_account: AccountId,
    /// Amount paid.
    pub paid_amount: Decimal,
    /// Difference written off.
    pub write_off: Option<WriteOff>,
}

/// An unlinked journal line allocated to an invoice on submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceAllocation {
    /// Journal voucher holding the advance.
    pub journal_voucher: String,
    /// Index of the advance line in that voucher.
    pub line: usize,
    /// Unadjusted amount of the line when the allocation was made.
    pub advance_amount: Decimal,
    /// Amount applied to this invoice.
    pub allocated_amount: Decimal,
}

impl AdvanceAllocation {
    /// Creates an allocation.
    pub fn new(
        journal_voucher: impl Into<String>,
        line: usize,
        advance_amount: Decimal,
        allocated_amount: Decimal,
    ) -> Self {
        Self {
            journal_voucher: journal_voucher.into(),
            line,
            advance_amount,
            allocated_amount,
        }
    }
}

/// Checks shared by both invoice kinds.
#[allow(clippy::too_many_arguments)]
fn validate_common(
    key: &VoucherKey,
    party: &str,
    party_account: AccountId,
    items: &[InvoiceItem],
    taxes: &[TaxLine],
    grand_total: Decimal,
    advances: &[AdvanceAllocation],
    ctx: &dyn PostingContext,
) -> Result<(), LedgerError> {
    if party.trim().is_empty() {
        return Err(LedgerError::MissingField { field: "party" });
    }
    let account = ctx.account(party_account)?;
    if account.report_type != ReportType::BalanceSheet {
        return Err(LedgerError::invalid(
            key,
            format!("Party account {} must be a Balance Sheet account", account.name),
        ));
    }
    if items.is_empty() {
        return Err(LedgerError::invalid(key, "Invoice has no items"));
    }

    let expected = round_amount(
        items.iter().map(|i| i.amount).sum::<Decimal>()
            + taxes.iter().map(TaxLine::signed).sum::<Decimal>(),
    );
    if expected != round_amount(grand_total) {
        return Err(LedgerError::GrandTotalMismatch {
            voucher: key.clone(),
            expected,
            actual: grand_total,
        });
    }

    for advance in advances {
        if advance.allocated_amount <= Decimal::ZERO
            || advance.allocated_amount > advance.advance_amount
        {
            return Err(LedgerError::invalid(
                key,
                format!(
                    "Allocated amount {} of advance {} must be positive and within {}",
                    advance.allocated_amount, advance.journal_voucher, advance.advance_amount
                ),
            ));
        }
    }
    let allocated: Decimal = advances.iter().map(|a| a.allocated_amount).sum();
    if allocated > grand_total {
        return Err(LedgerError::invalid(
            key,
            format!("Total allocated advance {allocated} exceeds grand total {grand_total}"),
        ));
    }
    Ok(())
}

// ============================================================================
// Sales invoice
// ============================================================================

/// A customer invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesInvoice {
    /// Common header.
    pub header: VoucherHeader,
    /// Customer.
    pub customer: String,
    /// Receivable account.
    pub debit_to: AccountId,
    /// Income lines.
    pub items: Vec<InvoiceItem>,
    /// Taxes and charges.
    pub taxes: Vec<TaxLine>,
    /// Items plus added minus deducted taxes.
    pub grand_total: Decimal,
    /// Point-of-sale payment.
    pub pos: Option<PosPayment>,
    /// Advances to allocate on submit.
    pub advances: Vec<AdvanceAllocation>,
}

impl SalesInvoice {
    /// Creates an invoice without lines.
    pub fn new(
        header: VoucherHeader,
        customer: impl Into<String>,
        debit_to: AccountId,
        grand_total: Decimal,
    ) -> Self {
        Self {
            header,
            customer: customer.into(),
            debit_to,
            items: Vec::new(),
            taxes: Vec::new(),
            grand_total,
            pos: None,
            advances: Vec::new(),
        }
    }

    /// Adds an income line.
    #[must_use]
    pub fn item(mut self, account: AccountId, amount: Decimal, cost_center: impl Into<String>) -> Self {
        self.items.push(InvoiceItem {
            account,
            amount,
            cost_center: Some(cost_center.into()),
        });
        self
    }

    /// Adds a tax line.
    #[must_use]
    pub fn tax(mut self, tax: TaxLine) -> Self {
        self.taxes.push(tax);
        self
    }

    /// Sets the point-of-sale payment.
    #[must_use]
    pub fn pos(mut self, pos: PosPayment) -> Self {
        self.pos = Some(pos);
        self
    }

    /// Adds an advance allocation.
    #[must_use]
    pub fn advance(mut self, advance: AdvanceAllocation) -> Self {
        self.advances.push(advance);
        self
    }

    fn party(&self) -> Option<String> {
        Some(self.customer.clone())
    }
}

impl Postable for SalesInvoice {
    fn header(&self) -> &VoucherHeader {
        &self.header
    }

    fn voucher_type(&self) -> VoucherType {
        VoucherType::SalesInvoice
    }

    fn validate(&self, ctx: &dyn PostingContext) -> Result<(), LedgerError> {
        let key = self.key();
        validate_common(
            &key,
            &self.customer,
            self.debit_to,
            &self.items,
            &self.taxes,
            self.grand_total,
            &self.advances,
            ctx,
        )?;

        if let Some(pos) = &self.pos {
            let write_off = pos.write_off.as_ref().map_or(Decimal::ZERO, |w| w.amount);
            if pos.paid_amount < Decimal::ZERO || write_off < Decimal::ZERO {
                return Err(LedgerError::invalid(&key, "Paid and write-off amounts cannot be negative"));
            }
            if pos.paid_amount + write_off > self.grand_total {
                return Err(LedgerError::invalid(
                    &key,
                    "Paid amount + Write Off Amount can not be greater than Grand Total",
                ));
            }
        }
        Ok(())
    }

    fn gl_entries(&self, _ctx: &dyn PostingContext) -> Result<Vec<EntryDraft>, LedgerError> {
        let own = Some(self.key());
        let mut rows = vec![
            EntryDraft::debit(self.debit_to, self.grand_total)
                .party(self.party())
                .against(own.clone()),
        ];
        for tax in &self.taxes {
            let row = match tax.effect {
                TaxEffect::Add => EntryDraft::credit(tax.account, tax.amount),
                TaxEffect::Deduct => EntryDraft::debit(tax.account, tax.amount),
            };
            rows.push(row.cost_center(tax.cost_center.clone()));
        }
        for item in &self.items {
            rows.push(EntryDraft::credit(item.account, item.amount).cost_center(item.cost_center.clone()));
        }

        // payment rows stay separate from the party debit
        let mut rows = merge_similar_entries(rows);

        if let Some(pos) = self.pos.as_ref().filter(|p| p.paid_amount > Decimal::ZERO) {
            rows.push(
                EntryDraft::credit(self.debit_to, pos.paid_amount)
                    .party(self.party())
                    .against(own.clone()),
            );
            rows.push(EntryDraft::debit(pos.cash_bank_account, pos.paid_amount));

            if let Some(write_off) = pos.write_off.as_ref().filter(|w| w.amount > Decimal::ZERO) {
                rows.push(
                    EntryDraft::credit(self.debit_to, write_off.amount)
                        .party(self.party())
                        .against(own.clone()),
                );
                rows.push(
                    EntryDraft::debit(write_off.account, write_off.amount)
                        .cost_center(write_off.cost_center.clone()),
                );
            }
        }
        Ok(rows)
    }
}

// ============================================================================
// Purchase invoice
// ============================================================================

/// A supplier invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseInvoice {
    /// Common header.
    pub header: VoucherHeader,
    /// Supplier.
    pub supplier: String,
    /// Payable account.
    pub credit_to: AccountId,
    /// Expense lines.
    pub items: Vec<InvoiceItem>,
    /// Taxes and charges.
    pub taxes: Vec<TaxLine>,
    /// Items plus added minus deducted taxes.
    pub grand_total: Decimal,
    /// Amount not to be paid, booked to a write-off account.
    pub write_off: Option<WriteOff>,
    /// Advances to allocate on submit.
    pub advances: Vec<AdvanceAllocation>,
    /// Supplier's bill number.
    pub bill_no: Option<String>,
    /// Supplier's bill date.
    pub bill_date: Option<NaiveDate>,
}

/// Bill numbers that do not identify a bill.
const PLACEHOLDER_BILL_NOS: [&str; 3] = ["na", "not applicable", "none"];

impl PurchaseInvoice {
    /// Creates an invoice without lines.
    pub fn new(
        header: VoucherHeader,
        supplier: impl Into<String>,
        credit_to: AccountId,
        grand_total: Decimal,
    ) -> Self {
        Self {
            header,
            supplier: supplier.into(),
            credit_to,
            items: Vec::new(),
            taxes: Vec::new(),
            grand_total,
            write_off: None,
            advances: Vec::new(),
            bill_no: None,
            bill_date: None,
        }
    }

    /// Sets the supplier's bill reference.
    #[must_use]
    pub fn bill(mut self, no: impl Into<String>, date: NaiveDate) -> Self {
        self.bill_no = Some(no.into());
        self.bill_date = Some(date);
        self
    }

    /// Adds an expense line.
    #[must_use]
    pub fn item(mut self, account: AccountId, amount: Decimal, cost_center: impl Into<String>) -> Self {
        self.items.push(InvoiceItem {
            account,
            amount,
            cost_center: Some(cost_center.into()),
        });
        self
    }

    /// Adds a tax line.
    #[must_use]
    pub fn tax(mut self, tax: TaxLine) -> Self {
        self.taxes.push(tax);
        self
    }

    /// Sets the write-off.
    #[must_use]
    pub fn write_off(mut self, write_off: WriteOff) -> Self {
        self.write_off = Some(write_off);
        self
    }

    /// Adds an advance allocation.
    #[must_use]
    pub fn advance(mut self, advance: AdvanceAllocation) -> Self {
        self.advances.push(advance);
        self
    }

    /// Grand total less the write-off.
    #[must_use]
    pub fn total_amount_to_pay(&self) -> Decimal {
        self.grand_total - self.write_off.as_ref().map_or(Decimal::ZERO, |w| w.amount)
    }

    /// The bill number, unless it is empty or a placeholder.
    fn real_bill_no(&self) -> Option<&str> {
        self.bill_no
            .as_deref()
            .map(str::trim)
            .filter(|no| !no.is_empty() && !PLACEHOLDER_BILL_NOS.contains(&no.to_lowercase().as_str()))
    }

    /// Rejects a bill already booked on another submitted invoice of the same
    /// supplier and payable account.
    fn validate_bill_no(&self, ctx: &dyn PostingContext) -> Result<(), LedgerError> {
        let Some(bill_no) = self.real_bill_no() else {
            return Ok(());
        };
        let existing = ctx
            .submitted(VoucherType::PurchaseInvoice)
            .into_iter()
            .filter_map(|voucher| match voucher {
                Voucher::PurchaseInvoice(pi) => Some(pi),
                _ => None,
            })
            .find(|pi| {
                pi.header.voucher_no != self.header.voucher_no
                    && pi.supplier == self.supplier
                    && pi.credit_to == self.credit_to
                    && pi.header.is_opening == self.header.is_opening
                    && pi.real_bill_no() == Some(bill_no)
            });
        match existing {
            Some(pi) => Err(LedgerError::DuplicateBillNo {
                voucher: self.key(),
                bill_no: bill_no.to_string(),
                existing: pi.header.voucher_no,
            }),
            None => Ok(()),
        }
    }
}

impl Postable for PurchaseInvoice {
    fn header(&self) -> &VoucherHeader {
        &self.header
    }

    fn voucher_type(&self) -> VoucherType {
        VoucherType::PurchaseInvoice
    }

    fn validate(&self, ctx: &dyn PostingContext) -> Result<(), LedgerError> {
        let key = self.key();
        validate_common(
            &key,
            &self.supplier,
            self.credit_to,
            &self.items,
            &self.taxes,
            self.grand_total,
            &self.advances,
            ctx,
        )?;
        self.validate_bill_no(ctx)?;
        if let Some(write_off) = &self.write_off {
            if write_off.amount < Decimal::ZERO || write_off.amount > self.grand_total {
                return Err(LedgerError::invalid(
                    &key,
                    "Write Off Amount must be between zero and the Grand Total",
                ));
            }
        }
        Ok(())
    }

    fn remarks(&self) -> String {
        if let Some(remarks) = self.header.remarks.as_deref().filter(|r| !r.trim().is_empty()) {
            return remarks.to_string();
        }
        match (self.real_bill_no(), self.bill_date) {
            (Some(no), Some(date)) => format!("Against Bill {no} dated {}", date.format("%d-%m-%Y")),
            _ => "No Remarks".to_string(),
        }
    }

    fn gl_entries(&self, _ctx: &dyn PostingContext) -> Result<Vec<EntryDraft>, LedgerError> {
        let mut rows = Vec::new();
        let to_pay = self.total_amount_to_pay();
        if to_pay > Decimal::ZERO {
            rows.push(
                EntryDraft::credit(self.credit_to, to_pay)
                    .party(Some(self.supplier.clone()))
                    .against(Some(self.key())),
            );
        }
        for tax in &self.taxes {
            let row = match tax.effect {
                TaxEffect::Add => EntryDraft::debit(tax.account, tax.amount),
                TaxEffect::Deduct => EntryDraft::credit(tax.account, tax.amount),
            };
            rows.push(row.cost_center(tax.cost_center.clone()));
        }
        for item in &self.items {
            rows.push(EntryDraft::debit(item.account, item.amount).cost_center(item.cost_center.clone()));
        }
        if let Some(write_off) = self.write_off.as_ref().filter(|w| w.amount > Decimal::ZERO) {
            rows.push(
                EntryDraft::credit(write_off.account, write_off.amount)
                    .cost_center(write_off.cost_center.clone()),
            );
        }
        Ok(rows)
    }
}
