//! Credit days, credit limits and supplier bill numbers.

mod common;

use rust_decimal_macros::dec;
use tally_core::ErrorKind;
use tally_core::ledger::{LedgerError, VoucherKey, VoucherType};
use tally_core::masters::{CreditTerms, Party};
use tally_core::voucher::{JournalKind, JournalLine, JournalVoucher};
use tally_shared::PeriodConfig;
use tally_shared::types::RoleSet;

use common::{Fixture, date, no_roles};

const CONTROLLER: &str = "Credit Controller";

fn controlled() -> Fixture {
    Fixture::with_period(PeriodConfig {
        credit_controller: Some(CONTROLLER.into()),
        ..PeriodConfig::default()
    })
}

fn controller() -> RoleSet {
    [CONTROLLER].into_iter().collect()
}

// ============================================================================
// Credit days
// ============================================================================

fn post_dated_receipt(f: &Fixture, no: &str, cheque_day: u32) -> JournalVoucher {
    f.journal(
        no,
        10,
        vec![
            JournalLine::debit(f.bank, dec!(100)),
            JournalLine::credit(f.debtors, dec!(100)).party("Globex"),
        ],
    )
    .kind(JournalKind::BankEntry)
    .cheque(format!("CHQ-{no}"), date(1, cheque_day))
}

#[test]
fn test_reference_date_beyond_credit_days_needs_controller() {
    let f = controlled();
    f.ledger.register_party(Party {
        credit_days: Some(7),
        ..Party::customer("Globex")
    });

    let err = f
        .ledger
        .submit(post_dated_receipt(&f, "JV-001", 20).into(), &no_roles())
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::CreditDaysExceeded {
            party: "Globex".into(),
            credit_days: 7,
            days: 10,
        }
    );
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert!(f.ledger.store().is_empty());

    f.ledger
        .submit(post_dated_receipt(&f, "JV-001", 17).into(), &no_roles())
        .unwrap();
    f.ledger
        .submit(post_dated_receipt(&f, "JV-002", 20).into(), &controller())
        .unwrap();
}

#[test]
fn test_company_credit_days_apply_to_unconfigured_parties() {
    let f = controlled();
    f.ledger.set_credit_terms(
        common::COMPANY,
        CreditTerms {
            credit_days: 5,
            credit_limit: dec!(0),
        },
    );
    assert!(matches!(
        f.ledger.submit(post_dated_receipt(&f, "JV-001", 16).into(), &no_roles()),
        Err(LedgerError::CreditDaysExceeded { credit_days: 5, .. })
    ));
}

// ============================================================================
// Credit limit
// ============================================================================

#[test]
fn test_sales_invoice_above_credit_limit_needs_controller() {
    let f = controlled();
    f.ledger.set_credit_terms(
        common::COMPANY,
        CreditTerms {
            credit_days: 0,
            credit_limit: dec!(1000),
        },
    );
    f.ledger
        .submit(f.sales_invoice("INV-001", dec!(800)).into(), &no_roles())
        .unwrap();

    let before = f.ledger.store().len();
    let err = f
        .ledger
        .submit(f.sales_invoice("INV-002", dec!(300)).into(), &no_roles())
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::CreditLimitExceeded {
            party: "Globex".into(),
            outstanding: dec!(1100),
            credit_limit: dec!(1000),
        }
    );
    assert_eq!(f.ledger.store().len(), before);

    f.ledger
        .submit(f.payment_against("JV-001", "INV-001", dec!(500)).into(), &no_roles())
        .unwrap();
    f.ledger
        .submit(f.sales_invoice("INV-002", dec!(300)).into(), &no_roles())
        .unwrap();
    f.ledger
        .submit(f.sales_invoice("INV-003", dec!(900)).into(), &controller())
        .unwrap();
}

#[test]
fn test_receipts_are_allowed_above_credit_limit() {
    let f = Fixture::new();
    f.ledger
        .submit(f.sales_invoice("INV-001", dec!(800)).into(), &no_roles())
        .unwrap();
    f.ledger.register_party(Party {
        credit_limit: Some(dec!(500)),
        ..Party::customer("Globex")
    });

    f.ledger
        .submit(f.payment_against("JV-001", "INV-001", dec!(100)).into(), &no_roles())
        .unwrap();
    assert!(matches!(
        f.ledger.submit(f.sales_invoice("INV-002", dec!(1)).into(), &no_roles()),
        Err(LedgerError::CreditLimitExceeded { .. })
    ));
}

// ============================================================================
// Supplier bill numbers
// ============================================================================

#[test]
fn test_supplier_bill_is_booked_once() {
    let f = Fixture::new();
    let bill = |no: &str| f.purchase_invoice(no, dec!(400)).bill("B-77", date(1, 10));

    let posted = f.ledger.submit(bill("PINV-001").into(), &no_roles()).unwrap();
    assert_eq!(posted.entries[0].remarks, "Against Bill B-77 dated 10-01-2024");

    let err = f
        .ledger
        .submit(bill("PINV-002").into(), &no_roles())
        .unwrap_err();
    assert!(matches!(
        &err,
        LedgerError::DuplicateBillNo { existing, .. } if existing == "PINV-001"
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);

    f.ledger
        .cancel(&VoucherKey::new(VoucherType::PurchaseInvoice, "PINV-001"), &no_roles())
        .unwrap();
    f.ledger.submit(bill("PINV-002").into(), &no_roles()).unwrap();
}
