//! Unlinked journal lines available as advances, consumed oldest first.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use super::allocation::{Allocation, Side};
use crate::ledger::types::VoucherKey;
use crate::voucher::{JournalVoucher, Postable};

/// An unlinked journal line for a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceLine {
    /// Journal voucher holding the line.
    pub voucher: VoucherKey,
    /// Line index.
    pub line: usize,
    /// Posting date of the voucher.
    pub posting_date: NaiveDate,
    /// Party account.
    pub account: AccountId,
    /// Party.
    pub party: String,
    /// Side of the amount.
    pub side: Side,
    /// Unadjusted amount.
    pub amount: Decimal,
}

impl AdvanceLine {
    /// Allocation of `amount` of this line to `target`.
    #[must_use]
    pub fn allocate(&self, target: &VoucherKey, amount: Decimal) -> Allocation {
        Allocation {
            source: self.voucher.clone(),
            line: self.line,
            target: target.clone(),
            account: self.account,
            party: Some(self.party.clone()),
            side: self.side,
            unadjusted_amount: self.amount,
            allocated_amount: amount,
        }
    }
}

/// Unlinked lines of submitted journal vouchers for `party` on `account`,
/// ordered by (posting date, voucher number, line index).
pub fn collect_advances<'a>(
    journals: impl IntoIterator<Item = &'a JournalVoucher>,
    party: &str,
    account: AccountId,
    side: Side,
) -> Vec<AdvanceLine> {
    let mut advances: Vec<AdvanceLine> = journals
        .into_iter()
        .flat_map(|jv| {
            jv.lines.iter().enumerate().filter_map(move |(idx, line)| {
                let amount = side.amount(line);
                (line.against.is_none()
                    && line.account == account
                    && line.party.as_deref() == Some(party)
                    && amount > Decimal::ZERO)
                    .then(|| AdvanceLine {
                        voucher: jv.key(),
                        line: idx,
                        posting_date: jv.header.posting_date,
                        account,
                        party: party.to_string(),
                        side,
                        amount,
                    })
            })
        })
        .collect();
    advances.sort_by(|a, b| {
        (a.posting_date, &a.voucher.voucher_no, a.line).cmp(&(b.posting_date, &b.voucher.voucher_no, b.line))
    });
    advances
}

/// Consumes `advances` in order until `amount` is covered; the last one may
/// be used partially.
pub fn allocate_fifo(advances: &[AdvanceLine], target: &VoucherKey, amount: Decimal) -> Vec<Allocation> {
    let mut remaining = amount;
    let mut allocations = Vec::new();
    for advance in advances {
        if remaining <= Decimal::ZERO {
            break;
        }
        let take = advance.amount.min(remaining);
        allocations.push(advance.allocate(target, take));
        remaining -= take;
    }
    allocations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::VoucherType;
    use crate::voucher::testing::{date, header};
    use crate::voucher::{JournalLine, VoucherHeader};
    use rust_decimal_macros::dec;

    fn receipt(no: &str, posting: NaiveDate, debtors: AccountId, amount: Decimal) -> JournalVoucher {
        let cash = AccountId::new();
        JournalVoucher::new(
            VoucherHeader {
                posting_date: posting,
                ..header(no)
            },
            vec![
                JournalLine::debit(cash, amount),
                JournalLine::credit(debtors, amount).party("Globex"),
            ],
        )
    }

    #[test]
    fn test_advances_are_ordered_oldest_first() {
        let debtors = AccountId::new();
        let jvs = [
            receipt("JV-003", date(1, 5), debtors, dec!(100)),
            receipt("JV-001", date(1, 10), debtors, dec!(200)),
            receipt("JV-002", date(1, 5), debtors, dec!(300)),
        ];
        let advances = collect_advances(&jvs, "Globex", debtors, Side::Credit);
        let order: Vec<&str> = advances.iter().map(|a| a.voucher.voucher_no.as_str()).collect();
        assert_eq!(order, ["JV-002", "JV-003", "JV-001"]);
    }

    #[test]
    fn test_linked_and_foreign_lines_are_skipped() {
        let debtors = AccountId::new();
        let mut linked = receipt("JV-001", date(1, 5), debtors, dec!(100));
        linked.lines[1].against = Some(VoucherKey::new(VoucherType::SalesInvoice, "INV-009"));
        let other_party = {
            let mut jv = receipt("JV-002", date(1, 5), debtors, dec!(100));
            jv.lines[1].party = Some("Initech".into());
            jv
        };
        let advances = collect_advances([&linked, &other_party], "Globex", debtors, Side::Credit);
        assert!(advances.is_empty());
    }

    #[test]
    fn test_fifo_consumes_last_partially() {
        let debtors = AccountId::new();
        let jvs = [
            receipt("JV-001", date(1, 5), debtors, dec!(300)),
            receipt("JV-002", date(1, 6), debtors, dec!(300)),
            receipt("JV-003", date(1, 7), debtors, dec!(300)),
        ];
        let advances = collect_advances(&jvs, "Globex", debtors, Side::Credit);
        let target = VoucherKey::new(VoucherType::SalesInvoice, "INV-001");
        let allocations = allocate_fifo(&advances, &target, dec!(450));

        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].allocated_amount, dec!(300));
        assert_eq!(allocations[1].allocated_amount, dec!(150));
        assert_eq!(allocations[1].unadjusted_amount, dec!(300));
        assert_eq!(allocations[1].source.voucher_no, "JV-002");
    }
}
