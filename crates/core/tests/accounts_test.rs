//! Chart of accounts operations with posted entries.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_core::accounts::{AccountError, AccountType, NewAccount, RenameOutcome};
use tally_core::ledger::{LedgerError, VoucherKey, VoucherType};
use tally_core::voucher::{JournalLine, PeriodClosingVoucher};

use common::{CC, COMPANY, Fixture, date, header, no_roles};

fn cash_sale(f: &Fixture, no: &str, day: u32, amount: Decimal) {
    let jv = f.journal(
        no,
        day,
        vec![
            JournalLine::debit(f.cash, amount),
            JournalLine::credit(f.sales, amount).cost_center(CC),
        ],
    );
    f.ledger.submit(jv.into(), &no_roles()).unwrap();
}

#[test]
fn test_group_with_children_cannot_become_ledger() {
    let f = Fixture::new();
    let err = f.ledger.convert_to_ledger(f.current_assets).unwrap_err();
    assert!(matches!(err, LedgerError::Account(AccountError::ChildExists(_))));
}

#[test]
fn test_account_with_entries_cannot_be_deleted_or_converted() {
    let f = Fixture::new();
    cash_sale(&f, "JV-001", 10, dec!(100));

    assert!(matches!(
        f.ledger.delete_account(f.cash),
        Err(LedgerError::Account(AccountError::TransactionsExist(_)))
    ));
    assert!(matches!(
        f.ledger.convert_to_group(f.cash),
        Err(LedgerError::Account(AccountError::TransactionsExist(_)))
    ));

    let unused = f
        .ledger
        .insert_account(NewAccount::ledger("Petty Cash", COMPANY).under(f.current_assets))
        .unwrap();
    let removed = f.ledger.delete_account(unused).unwrap();
    assert_eq!(removed.name, "Petty Cash");
    assert!(f.ledger.account(unused).is_err());
}

#[test]
fn test_move_keeps_containment() {
    let f = Fixture::new();
    let fixed = f
        .ledger
        .insert_account(NewAccount::group("Fixed Assets", COMPANY).under(f.assets))
        .unwrap();
    f.ledger.move_account(f.bank, fixed).unwrap();

    let assets = f.ledger.account(f.assets).unwrap();
    let fixed = f.ledger.account(fixed).unwrap();
    let bank = f.ledger.account(f.bank).unwrap();
    assert!(fixed.contains(&bank));
    assert!(assets.contains(&bank));
    assert!(!f.ledger.account(f.current_assets).unwrap().contains(&bank));

    assert!(matches!(
        f.ledger.move_account(f.assets, f.current_assets),
        Err(LedgerError::Account(_))
    ));
}

#[test]
fn test_merge_moves_entries_and_balances() {
    let f = Fixture::new();
    let till = f
        .ledger
        .insert_account(
            NewAccount::ledger("Till", COMPANY)
                .under(f.current_assets)
                .account_type(AccountType::Cash),
        )
        .unwrap();
    cash_sale(&f, "JV-001", 10, dec!(300));
    let jv = f.journal(
        "JV-002",
        11,
        vec![
            JournalLine::debit(till, dec!(200)),
            JournalLine::credit(f.sales, dec!(200)).cost_center(CC),
        ],
    );
    f.ledger.submit(jv.into(), &no_roles()).unwrap();

    let outcome = f.ledger.rename_account(till, "Cash", true).unwrap();
    assert_eq!(outcome, RenameOutcome::Merged { from: till, into: f.cash });

    assert!(f.ledger.account(till).is_err());
    assert_eq!(f.balance(f.cash), dec!(500));
    assert_eq!(f.balance(f.current_assets), dec!(500));
    assert!(f.ledger.store().account_entries(till).is_empty());

    // cancelling a voucher posted on the merged account reverses the survivor
    f.ledger
        .cancel(&VoucherKey::new(VoucherType::JournalVoucher, "JV-002"), &no_roles())
        .unwrap();
    assert_eq!(f.balance(f.cash), dec!(300));
}

#[test]
fn test_rename_and_lookup() {
    let f = Fixture::new();
    let outcome = f.ledger.rename_account(f.bank, "Main Bank", false).unwrap();
    assert_eq!(outcome, RenameOutcome::Renamed(f.bank));
    assert_eq!(f.ledger.find_account("Main Bank", COMPANY).unwrap().unwrap().id, f.bank);
    assert!(f.ledger.find_account("Bank", COMPANY).unwrap().is_none());

    assert!(f.ledger.rename_account(f.bank, "Cash", false).is_err());
}

#[test]
fn test_group_balance_sums_descendants() {
    let f = Fixture::new();
    cash_sale(&f, "JV-001", 10, dec!(250));
    let jv = f.journal(
        "JV-002",
        12,
        vec![
            JournalLine::debit(f.bank, dec!(100)),
            JournalLine::credit(f.cash, dec!(100)),
        ],
    );
    f.ledger.submit(jv.into(), &no_roles()).unwrap();

    assert_eq!(f.balance(f.cash), dec!(150));
    assert_eq!(f.balance(f.bank), dec!(100));
    assert_eq!(f.balance(f.current_assets), dec!(250));
    assert_eq!(f.balance(f.assets), dec!(250));
    assert_eq!(f.balance(f.income), dec!(250));

    // as-of excludes later rows
    assert_eq!(
        f.ledger.get_balance(f.cash, Some(date(1, 11))).unwrap(),
        dec!(250)
    );
}

#[test]
fn test_trial_balance_is_balanced() {
    let f = Fixture::new();
    cash_sale(&f, "JV-001", 10, dec!(500));
    f.ledger
        .submit(f.sales_invoice("INV-001", dec!(700)).into(), &no_roles())
        .unwrap();

    let report = f.ledger.trial_balance(COMPANY, None).unwrap();
    assert!(report.totals.is_balanced);
    assert_eq!(report.totals.total_debit, dec!(1200));
    assert_eq!(report.totals.total_credit, dec!(1200));
    assert_eq!(report.rows.len(), 3);

    let sales = report.rows.iter().find(|r| r.account == f.sales).unwrap();
    assert_eq!(sales.credit_total, dec!(1200));
    assert_eq!(sales.balance, dec!(1200));

    let early = f.ledger.trial_balance(COMPANY, Some(date(1, 12))).unwrap();
    assert_eq!(early.totals.total_debit, dec!(500));
    assert!(f.ledger.trial_balance("Other Co", None).unwrap().rows.is_empty());
}

#[test]
fn test_period_closing_zeroes_profit_and_loss() {
    let f = Fixture::new();
    cash_sale(&f, "JV-001", 10, dec!(900));
    let jv = f.journal(
        "JV-002",
        12,
        vec![
            JournalLine::debit(f.purchases, dec!(400)).cost_center(CC),
            JournalLine::credit(f.cash, dec!(400)),
        ],
    );
    f.ledger.submit(jv.into(), &no_roles()).unwrap();

    let pcv = PeriodClosingVoucher::new(header("PCV-2024", 12, 31).remarks("Year end"), f.retained);
    let posted = f.ledger.submit(pcv.into(), &no_roles()).unwrap();

    assert_eq!(posted.entries.len(), 3);
    assert_eq!(f.balance(f.sales), Decimal::ZERO);
    assert_eq!(f.balance(f.purchases), Decimal::ZERO);
    assert_eq!(f.balance(f.retained), dec!(500));
    assert_eq!(f.balance(f.cash), dec!(500));
}

#[test]
fn test_period_closing_needs_balance_sheet_account() {
    let f = Fixture::new();
    let pcv = PeriodClosingVoucher::new(header("PCV-2024", 12, 31).remarks("Year end"), f.sales);
    assert!(f.ledger.submit(pcv.into(), &no_roles()).is_err());
}
