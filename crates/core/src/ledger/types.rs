//! Ledger domain types shared by vouchers, the store and the index.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of business document that produces ledger entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherType {
    /// Manual journal voucher (payments, receipts, adjustments).
    JournalVoucher,
    /// Customer invoice.
    SalesInvoice,
    /// Supplier invoice.
    PurchaseInvoice,
    /// Year-end transfer of profit and loss balances.
    PeriodClosingVoucher,
}

impl VoucherType {
    /// Returns the display name of the voucher type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::JournalVoucher => "Journal Voucher",
            Self::SalesInvoice => "Sales Invoice",
            Self::PurchaseInvoice => "Purchase Invoice",
            Self::PeriodClosingVoucher => "Period Closing Voucher",
        }
    }

    /// Returns true for supplier-side documents whose outstanding is credit-positive.
    #[must_use]
    pub const fn is_purchase_side(&self) -> bool {
        matches!(self, Self::PurchaseInvoice)
    }

    /// Returns true for documents that carry an `outstanding_amount` field.
    #[must_use]
    pub const fn is_invoice(&self) -> bool {
        matches!(self, Self::SalesInvoice | Self::PurchaseInvoice)
    }
}

impl fmt::Display for VoucherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a voucher: its type plus its document number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoucherKey {
    /// The voucher type.
    pub voucher_type: VoucherType,
    /// The document number, e.g. `INV-001`.
    pub voucher_no: String,
}

impl VoucherKey {
    /// Creates a voucher key.
    pub fn new(voucher_type: VoucherType, voucher_no: impl Into<String>) -> Self {
        Self {
            voucher_type,
            voucher_no: voucher_no.into(),
        }
    }
}

impl fmt::Display for VoucherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.voucher_type, self.voucher_no)
    }
}

/// Key of an outstanding balance: the referenced document and the party.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutstandingKey {
    /// The against-voucher.
    pub against: VoucherKey,
    /// The party whose entries are summed.
    pub party: Option<String>,
}

impl OutstandingKey {
    /// Creates an outstanding key.
    pub fn new(against: VoucherKey, party: Option<String>) -> Self {
        Self { against, party }
    }
}

/// Document status of a voucher.
///
/// Valid transitions:
/// - Draft → Submitted (submit)
/// - Submitted → Cancelled (cancel)
///
/// Amending a cancelled voucher creates a new Draft; the original stays Cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocStatus {
    /// Editable, no ledger effect.
    #[default]
    Draft,
    /// Posted to the ledger (immutable).
    Submitted,
    /// Reversed in the ledger (immutable).
    Cancelled,
}

impl DocStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
