//! Property-based tests for row and entry set validation.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, DebitCredit};

use super::entry::{EntryDraft, EntryHeader, LedgerEntry};
use super::error::LedgerError;
use super::types::{VoucherKey, VoucherType};
use super::validation::{validate_entries, validate_row};
use crate::accounts::{Account, NormalBalance, ReportType};
use crate::masters::MasterData;

/// Strategy to generate a positive amount with up to 4 decimal places.
fn fine_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|n| Decimal::new(n, 4))
}

/// Strategy to generate a positive amount at posting precision.
fn cents() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn account() -> Account {
    Account {
        id: AccountId::new(),
        name: "Cash".into(),
        parent: Some(AccountId::new()),
        company: "Acme".into(),
        is_group: false,
        report_type: ReportType::BalanceSheet,
        account_type: None,
        normal_balance: NormalBalance::Debit,
        frozen: false,
        disabled: false,
        balance_must_be: None,
        lft: 2,
        rgt: 3,
    }
}

fn key() -> VoucherKey {
    VoucherKey::new(VoucherType::JournalVoucher, "JV-001")
}

fn row(account: &Account, amount: DebitCredit) -> LedgerEntry {
    let header = EntryHeader {
        voucher: key(),
        company: "Acme".into(),
        posting_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        fiscal_year: "2024".into(),
        remarks: "prop".into(),
        is_opening: false,
    };
    LedgerEntry::from_draft(&header, EntryDraft::new(account.id, amount))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Rows are stored at posting precision
    // =========================================================================

    #[test]
    fn prop_validated_rows_have_two_decimals(amount in fine_amount()) {
        let acc = account();
        let mut entry = row(&acc, DebitCredit::debit(amount));
        match validate_row(&mut entry, &acc, &MasterData::new()) {
            Ok(()) => prop_assert!(entry.debit.scale() <= 2),
            Err(err) => prop_assert!(matches!(err, LedgerError::ZeroAmount { .. }), "unexpected error: {:?}", err),
        }
    }

    // =========================================================================
    // A debit split into credits of the same total always balances
    // =========================================================================

    #[test]
    fn prop_split_credits_balance(parts in prop::collection::vec(cents(), 1..8)) {
        let acc = account();
        let total: Decimal = parts.iter().copied().sum();
        let mut rows = vec![row(&acc, DebitCredit::debit(total))];
        rows.extend(parts.iter().map(|p| row(&acc, DebitCredit::credit(*p))));

        let totals = validate_entries(&key(), &rows).unwrap();
        prop_assert_eq!(totals.debit, total);
        prop_assert!(totals.is_balanced());
    }

    // =========================================================================
    // Any difference of a cent or more is rejected
    // =========================================================================

    #[test]
    fn prop_off_by_cents_rejected(amount in cents(), diff in 1i64..10_000i64) {
        let acc = account();
        let rows = vec![
            row(&acc, DebitCredit::debit(amount + Decimal::new(diff, 2))),
            row(&acc, DebitCredit::credit(amount)),
        ];
        let is_unbalanced = matches!(
            validate_entries(&key(), &rows),
            Err(LedgerError::Unbalanced { .. })
        );
        prop_assert!(is_unbalanced);
    }
}
