//! Linking unlinked journal lines to the documents they settle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use crate::ledger::error::LedgerError;
use crate::ledger::types::{VoucherKey, VoucherType};
use crate::voucher::{JournalLine, JournalVoucher, Postable};

/// Side of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Debit column.
    Debit,
    /// Credit column.
    Credit,
}

impl Side {
    /// Side on which a payment settling `target` sits on the party account.
    #[must_use]
    pub const fn settling(target: VoucherType) -> Self {
        if target.is_purchase_side() {
            Self::Debit
        } else {
            Self::Credit
        }
    }

    /// Amount of `line` on this side.
    #[must_use]
    pub const fn amount(self, line: &JournalLine) -> Decimal {
        match self {
            Self::Debit => line.debit,
            Self::Credit => line.credit,
        }
    }

    fn set(self, line: &mut JournalLine, amount: Decimal) {
        match self {
            Self::Debit => line.debit = amount,
            Self::Credit => line.credit = amount,
        }
    }
}

/// One unlinked journal line, or part of it, applied to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Journal voucher holding the line.
    pub source: VoucherKey,
    /// Line index in the source voucher.
    pub line: usize,
    /// Document being settled.
    pub target: VoucherKey,
    /// Party account of the line.
    pub account: AccountId,
    /// Party of the line.
    pub party: Option<String>,
    /// Side the line amount sits on.
    pub side: Side,
    /// Amount the line held when the allocation was prepared.
    pub unadjusted_amount: Decimal,
    /// Amount applied to the target.
    pub allocated_amount: Decimal,
}

/// Applies allocations to journal vouchers.
pub struct AllocationPlanner;

impl AllocationPlanner {
    /// Returns a copy of `jv` with each allocation's line linked to its target.
    ///
    /// A partial allocation keeps the allocated part on the original line and
    /// appends the remainder as a new unlinked line, so earlier line indexes
    /// stay valid for the following allocations.
    pub fn apply(jv: &JournalVoucher, allocations: &[&Allocation]) -> Result<JournalVoucher, LedgerError> {
        let key = jv.key();
        let mut planned = jv.clone();
        for allocation in allocations {
            if allocation.allocated_amount <= Decimal::ZERO
                || allocation.allocated_amount > allocation.unadjusted_amount
            {
                return Err(LedgerError::invalid(
                    &key,
                    format!(
                        "Allocated amount {} must be positive and within {}",
                        allocation.allocated_amount, allocation.unadjusted_amount
                    ),
                ));
            }
            let stale = || LedgerError::StaleAllocation {
                voucher: key.clone(),
                line: allocation.line,
                expected: allocation.unadjusted_amount,
            };
            let line = planned.lines.get_mut(allocation.line).ok_or_else(stale)?;
            if line.against.is_some()
                || line.account != allocation.account
                || line.party != allocation.party
                || allocation.side.amount(line) != allocation.unadjusted_amount
            {
                return Err(stale());
            }

            line.against = Some(allocation.target.clone());
            let remainder = allocation.unadjusted_amount - allocation.allocated_amount;
            if remainder > Decimal::ZERO {
                allocation.side.set(line, allocation.allocated_amount);
                let mut rest = line.clone();
                rest.against = None;
                allocation.side.set(&mut rest, remainder);
                planned.lines.push(rest);
            }
        }
        Ok(planned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voucher::testing::header;
    use rust_decimal_macros::dec;

    struct Fixture {
        jv: JournalVoucher,
        debtors: AccountId,
        invoice: VoucherKey,
    }

    fn fixture() -> Fixture {
        let (cash, debtors) = (AccountId::new(), AccountId::new());
        let jv = JournalVoucher::new(
            header("JV-001"),
            vec![
                JournalLine::debit(cash, dec!(500)),
                JournalLine::credit(debtors, dec!(500)).party("Globex").advance(),
            ],
        );
        Fixture {
            jv,
            debtors,
            invoice: VoucherKey::new(VoucherType::SalesInvoice, "INV-001"),
        }
    }

    fn allocation(f: &Fixture, unadjusted: Decimal, allocated: Decimal) -> Allocation {
        Allocation {
            source: VoucherKey::new(VoucherType::JournalVoucher, "JV-001"),
            line: 1,
            target: f.invoice.clone(),
            account: f.debtors,
            party: Some("Globex".into()),
            side: Side::Credit,
            unadjusted_amount: unadjusted,
            allocated_amount: allocated,
        }
    }

    #[test]
    fn test_full_allocation_links_line() {
        let f = fixture();
        let planned = AllocationPlanner::apply(&f.jv, &[&allocation(&f, dec!(500), dec!(500))]).unwrap();
        assert_eq!(planned.lines.len(), 2);
        assert_eq!(planned.lines[1].against, Some(f.invoice.clone()));
        assert_eq!(planned.lines[1].credit, dec!(500));
    }

    #[test]
    fn test_partial_allocation_splits_remainder() {
        let f = fixture();
        let planned = AllocationPlanner::apply(&f.jv, &[&allocation(&f, dec!(500), dec!(200))]).unwrap();
        assert_eq!(planned.lines.len(), 3);
        assert_eq!(planned.lines[1].credit, dec!(200));
        assert_eq!(planned.lines[1].against, Some(f.invoice.clone()));
        assert_eq!(planned.lines[2].credit, dec!(300));
        assert!(planned.lines[2].against.is_none());
        assert_eq!(planned.lines[2].party.as_deref(), Some("Globex"));
    }

    #[test]
    fn test_stale_amount_rejected() {
        let f = fixture();
        let err = AllocationPlanner::apply(&f.jv, &[&allocation(&f, dec!(450), dec!(200))]).unwrap_err();
        assert!(matches!(err, LedgerError::StaleAllocation { line: 1, .. }));
    }

    #[test]
    fn test_same_line_twice_is_stale() {
        let f = fixture();
        let a = allocation(&f, dec!(500), dec!(500));
        assert!(matches!(
            AllocationPlanner::apply(&f.jv, &[&a, &a]),
            Err(LedgerError::StaleAllocation { .. })
        ));
    }

    #[test]
    fn test_over_allocation_rejected() {
        let f = fixture();
        assert!(matches!(
            AllocationPlanner::apply(&f.jv, &[&allocation(&f, dec!(500), dec!(600))]),
            Err(LedgerError::InvalidVoucher { .. })
        ));
    }

    #[test]
    fn test_settling_side() {
        assert_eq!(Side::settling(VoucherType::SalesInvoice), Side::Credit);
        assert_eq!(Side::settling(VoucherType::PurchaseInvoice), Side::Debit);
    }
}
