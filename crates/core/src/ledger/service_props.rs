//! Property-based tests for LedgerService.

use std::collections::HashMap;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::entry::{EntryDraft, EntryHeader};
use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{VoucherKey, VoucherType};
use crate::accounts::{Account, NormalBalance, ReportType};
use crate::masters::{FiscalYear, MasterData};

fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn ledger(name: String) -> Account {
    Account {
        id: AccountId::new(),
        name,
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

fn header() -> EntryHeader {
    EntryHeader {
        voucher: VoucherKey::new(VoucherType::JournalVoucher, "JV-100"),
        company: "Acme".into(),
        posting_date: NaiveDate::from_ymd_opt(2024, 5, 5).unwrap(),
        fiscal_year: "2024".into(),
        remarks: "prop".into(),
        is_opening: false,
    }
}

fn masters() -> MasterData {
    let mut m = MasterData::new();
    m.add_fiscal_year(FiscalYear::new(
        "2024",
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    ))
    .unwrap();
    m
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Balanced drafts produce a set whose totals match the drafts
    // =========================================================================

    #[test]
    fn prop_balanced_drafts_accepted(amounts in prop::collection::vec(positive_amount(), 1..6)) {
        let accounts: Vec<Account> = (0..=amounts.len()).map(|i| ledger(format!("A{i}"))).collect();
        let map: HashMap<AccountId, Account> = accounts.iter().map(|a| (a.id, a.clone())).collect();
        let total: Decimal = amounts.iter().copied().sum();

        let mut drafts = vec![EntryDraft::debit(accounts[0].id, total)];
        drafts.extend(
            amounts.iter().zip(&accounts[1..]).map(|(amount, acc)| EntryDraft::credit(acc.id, *amount)),
        );

        let (entries, totals) = LedgerService::build_entries(
            &header(),
            drafts,
            |id| map.get(&id).cloned().ok_or(LedgerError::AccountNotFound(id)),
            &masters(),
        ).unwrap();

        prop_assert_eq!(entries.len(), amounts.len() + 1);
        prop_assert_eq!(totals.debit, total);
        prop_assert_eq!(totals.credit, total);
    }

    // =========================================================================
    // A single-sided set never passes
    // =========================================================================

    #[test]
    fn prop_single_sided_rejected(amounts in prop::collection::vec(positive_amount(), 1..6)) {
        let acc = ledger("Cash".into());
        let drafts: Vec<EntryDraft> = amounts.iter().map(|a| EntryDraft::debit(acc.id, *a)).collect();
        let result = LedgerService::build_entries(
            &header(),
            drafts,
            |_| Ok(acc.clone()),
            &masters(),
        );
        let is_unbalanced = matches!(result, Err(LedgerError::Unbalanced { .. }));
        prop_assert!(is_unbalanced);
    }
}
