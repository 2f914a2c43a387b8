//! Ledger service: turns a voucher's candidate rows into a validated entry set.
//!
//! Pure logic with no storage access. Account lookups come in through a
//! closure so the caller decides which snapshot of the tree is consulted.

use tally_shared::types::{AccountId, DebitCredit};

use super::entry::{EntryDraft, EntryHeader, LedgerEntry};
use super::error::LedgerError;
use super::validation::{validate_entries, validate_row};
use crate::accounts::Account;
use crate::masters::MasterData;

/// Ledger service for entry set validation.
pub struct LedgerService;

impl LedgerService {
    /// Validates a header and its drafts, producing unsequenced ledger rows.
    ///
    /// Steps:
    /// 1. Header fields are present and the fiscal year contains the posting date
    /// 2. Each row passes [`validate_row`] (amounts rounded to posting precision)
    /// 3. The rounded set balances exactly
    ///
    /// # Errors
    ///
    /// Returns the first failure; no partial result is produced.
    pub fn build_entries<A>(
        header: &EntryHeader,
        drafts: Vec<EntryDraft>,
        account_lookup: A,
        masters: &MasterData,
    ) -> Result<(Vec<LedgerEntry>, DebitCredit), LedgerError>
    where
        A: Fn(AccountId) -> Result<Account, LedgerError>,
    {
        Self::validate_header(header, masters)?;

        let mut entries = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let account = account_lookup(draft.account)?;
            let mut entry = LedgerEntry::from_draft(header, draft);
            validate_row(&mut entry, &account, masters)?;
            entries.push(entry);
        }

        let totals = validate_entries(&header.voucher, &entries)?;
        Ok((entries, totals))
    }

    /// Checks the mandatory header fields.
    ///
    /// # Errors
    ///
    /// `MissingField`, `UnknownFiscalYear` or `PostingDateOutsideFiscalYear`.
    pub fn validate_header(header: &EntryHeader, masters: &MasterData) -> Result<(), LedgerError> {
        if header.voucher.voucher_no.trim().is_empty() {
            return Err(LedgerError::MissingField {
                field: "voucher_no",
            });
        }
        if header.company.trim().is_empty() {
            return Err(LedgerError::MissingField { field: "company" });
        }
        if header.fiscal_year.trim().is_empty() {
            return Err(LedgerError::MissingField {
                field: "fiscal_year",
            });
        }
        masters.validate_fiscal_year(&header.fiscal_year, header.posting_date)
    }

    /// Sums the debit and credit sides of a set of rows.
    #[must_use]
    pub fn calculate_totals(entries: &[LedgerEntry]) -> DebitCredit {
        entries.iter().map(LedgerEntry::amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{NormalBalance, ReportType};
    use crate::ledger::types::{VoucherKey, VoucherType};
    use crate::masters::FiscalYear;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn ledger(name: &str, report_type: ReportType) -> Account {
        Account {
            id: AccountId::new(),
            name: name.into(),
            parent: Some(AccountId::new()),
            company: "Acme".into(),
            is_group: false,
            report_type,
            account_type: None,
            normal_balance: NormalBalance::Debit,
            frozen: false,
            disabled: false,
            balance_must_be: None,
            lft: 2,
            rgt: 3,
        }
    }

    fn header(date: NaiveDate) -> EntryHeader {
        EntryHeader {
            voucher: VoucherKey::new(VoucherType::JournalVoucher, "JV-001"),
            company: "Acme".into(),
            posting_date: date,
            fiscal_year: "2024".into(),
            remarks: "No remarks".into(),
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
        m.add_cost_center("Main", "Acme");
        m
    }

    fn lookup(accounts: &[Account]) -> impl Fn(AccountId) -> Result<Account, LedgerError> {
        let map: HashMap<AccountId, Account> =
            accounts.iter().map(|a| (a.id, a.clone())).collect();
        move |id| map.get(&id).cloned().ok_or(LedgerError::AccountNotFound(id))
    }

    #[test]
    fn test_build_balanced_entries() {
        let cash = ledger("Cash", ReportType::BalanceSheet);
        let sales = ledger("Sales", ReportType::ProfitAndLoss);
        let drafts = vec![
            EntryDraft::debit(cash.id, dec!(500)),
            EntryDraft::credit(sales.id, dec!(500)).cost_center(Some("Main".into())),
        ];
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let (entries, totals) = LedgerService::build_entries(
            &header(date),
            drafts,
            lookup(&[cash.clone(), sales.clone()]),
            &masters(),
        )
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(totals, DebitCredit::new(dec!(500), dec!(500)));
        assert_eq!(LedgerService::calculate_totals(&entries), totals);
    }

    #[test]
    fn test_rows_round_before_balancing() {
        let cash = ledger("Cash", ReportType::BalanceSheet);
        let bank = ledger("Bank", ReportType::BalanceSheet);
        // 100.005 rounds to 100.00 (half even), matching the credit side
        let drafts = vec![
            EntryDraft::debit(cash.id, dec!(100.005)),
            EntryDraft::credit(bank.id, dec!(100.00)),
        ];
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (entries, _) = LedgerService::build_entries(
            &header(date),
            drafts,
            lookup(&[cash.clone(), bank.clone()]),
            &masters(),
        )
        .unwrap();
        assert_eq!(entries[0].debit, dec!(100.00));
    }

    #[test]
    fn test_rounding_difference_is_rejected() {
        let cash = ledger("Cash", ReportType::BalanceSheet);
        let bank = ledger("Bank", ReportType::BalanceSheet);
        let drafts = vec![
            EntryDraft::debit(cash.id, dec!(100.006)),
            EntryDraft::credit(bank.id, dec!(100.00)),
        ];
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let result = LedgerService::build_entries(
            &header(date),
            drafts,
            lookup(&[cash.clone(), bank.clone()]),
            &masters(),
        );
        assert!(matches!(result, Err(LedgerError::Unbalanced { .. })));
    }

    #[test]
    fn test_posting_date_outside_fiscal_year() {
        let cash = ledger("Cash", ReportType::BalanceSheet);
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let result = LedgerService::build_entries(
            &header(date),
            vec![EntryDraft::debit(cash.id, dec!(1))],
            lookup(&[cash.clone()]),
            &masters(),
        );
        assert!(matches!(
            result,
            Err(LedgerError::PostingDateOutsideFiscalYear { .. })
        ));
    }

    #[test]
    fn test_unknown_account() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let result = LedgerService::build_entries(
            &header(date),
            vec![EntryDraft::debit(AccountId::new(), dec!(1))],
            lookup(&[]),
            &masters(),
        );
        assert!(matches!(result, Err(LedgerError::AccountNotFound(_))));
    }
}
