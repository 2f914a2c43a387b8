//! Outstanding amount of an invoice or journal voucher.

use rust_decimal::Decimal;
use tally_shared::types::DebitCredit;

use crate::ledger::error::LedgerError;
use crate::ledger::types::{OutstandingKey, VoucherType};

/// Derives outstanding amounts from ledger aggregates.
pub struct OutstandingCalculator;

impl OutstandingCalculator {
    /// Outstanding of `key` from the rows that reference it (`against`) and,
    /// for journal vouchers, the voucher's own unlinked rows (`on_account`).
    ///
    /// Receivables are positive as debit balances, payables as credit
    /// balances. A journal voucher with a credit on-account amount reports
    /// what is still unadjusted of that credit.
    #[must_use]
    pub fn compute(key: &OutstandingKey, against: DebitCredit, on_account: DebitCredit) -> Decimal {
        let bal = against.net();
        match key.against.voucher_type {
            VoucherType::PurchaseInvoice => -bal,
            VoucherType::JournalVoucher => {
                let own = on_account.net();
                let bal = own + bal;
                if own < Decimal::ZERO { -bal } else { bal }
            }
            VoucherType::SalesInvoice | VoucherType::PeriodClosingVoucher => bal,
        }
    }

    /// Rejects a negative outstanding unless it comes from a cancellation.
    pub fn check(key: &OutstandingKey, outstanding: Decimal, on_cancel: bool) -> Result<Decimal, LedgerError> {
        if outstanding < Decimal::ZERO && !on_cancel {
            return Err(LedgerError::OutstandingNegative {
                voucher: key.against.clone(),
                party: key.party.clone(),
                outstanding,
            });
        }
        Ok(outstanding)
    }
}
