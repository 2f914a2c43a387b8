//! Shared fixture for engine integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::GeneralLedger;
use tally_core::accounts::{AccountType, NewAccount, NormalBalance, ReportType};
use tally_core::ledger::{VoucherKey, VoucherType};
use tally_core::masters::{FiscalYear, Party};
use tally_core::voucher::{JournalLine, JournalVoucher, PurchaseInvoice, SalesInvoice, VoucherHeader};
use tally_shared::types::{AccountId, RoleSet};
use tally_shared::{EngineConfig, PeriodConfig};

pub const COMPANY: &str = "Acme";
pub const CC: &str = "Main - AC";
pub const MANAGER: &str = "Accounts Manager";

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

pub fn header(no: &str, month: u32, day: u32) -> VoucherHeader {
    VoucherHeader::new(no, COMPANY, date(month, day), "2024")
}

pub fn no_roles() -> RoleSet {
    RoleSet::empty()
}

pub fn manager() -> RoleSet {
    [MANAGER].into_iter().collect()
}

/// Chart used by every test:
///
/// ```text
/// Assets (BS)
///   Current Assets
///     Bank, Cash, Debtors
/// Liabilities (BS, credit)
///   Creditors, VAT, Retained Earnings
/// Income (P&L, credit)
///   Sales
/// Expenses (P&L)
///   Purchases, Write Off
/// ```
pub struct Fixture {
    pub ledger: GeneralLedger,
    pub assets: AccountId,
    pub current_assets: AccountId,
    pub bank: AccountId,
    pub cash: AccountId,
    pub debtors: AccountId,
    pub creditors: AccountId,
    pub vat: AccountId,
    pub retained: AccountId,
    pub income: AccountId,
    pub sales: AccountId,
    pub purchases: AccountId,
    pub write_off: AccountId,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_period(PeriodConfig::default())
    }

    pub fn with_period(period: PeriodConfig) -> Self {
        let engine = EngineConfig {
            lock_attempts: 20,
            lock_timeout_ms: 500,
            lock_backoff_ms: 1,
        };
        let ledger = GeneralLedger::new(period, engine);
        ledger
            .add_fiscal_year(FiscalYear::new("2024", date(1, 1), date(12, 31)))
            .unwrap();
        ledger.add_cost_center(CC, COMPANY);
        ledger.register_party(Party::customer("Globex"));
        ledger.register_party(Party::supplier("Initech"));

        let insert = |account: NewAccount| ledger.insert_account(account).unwrap();
        let assets = insert(NewAccount::group("Assets", COMPANY).report_type(ReportType::BalanceSheet));
        let current_assets = insert(NewAccount::group("Current Assets", COMPANY).under(assets));
        let bank = insert(NewAccount::ledger("Bank", COMPANY).under(current_assets).account_type(AccountType::Bank));
        let cash = insert(NewAccount::ledger("Cash", COMPANY).under(current_assets).account_type(AccountType::Cash));
        let debtors = insert(
            NewAccount::ledger("Debtors", COMPANY)
                .under(current_assets)
                .account_type(AccountType::Receivable),
        );
        let liabilities = insert(
            NewAccount::group("Liabilities", COMPANY)
                .report_type(ReportType::BalanceSheet)
                .normal_balance(NormalBalance::Credit),
        );
        let creditors = insert(
            NewAccount::ledger("Creditors", COMPANY)
                .under(liabilities)
                .account_type(AccountType::Payable),
        );
        let vat = insert(NewAccount::ledger("VAT", COMPANY).under(liabilities).account_type(AccountType::Tax));
        let retained = insert(NewAccount::ledger("Retained Earnings", COMPANY).under(liabilities));
        let income = insert(
            NewAccount::group("Income", COMPANY)
                .report_type(ReportType::ProfitAndLoss)
                .normal_balance(NormalBalance::Credit),
        );
        let sales = insert(NewAccount::ledger("Sales", COMPANY).under(income).account_type(AccountType::Income));
        let expenses = insert(NewAccount::group("Expenses", COMPANY).report_type(ReportType::ProfitAndLoss));
        let purchases = insert(NewAccount::ledger("Purchases", COMPANY).under(expenses).account_type(AccountType::Expense));
        let write_off = insert(NewAccount::ledger("Write Off", COMPANY).under(expenses).account_type(AccountType::Expense));

        Self {
            ledger,
            assets,
            current_assets,
            bank,
            cash,
            debtors,
            creditors,
            vat,
            retained,
            income,
            sales,
            purchases,
            write_off,
        }
    }

    /// A journal voucher dated in January with a user remark.
    pub fn journal(&self, no: &str, day: u32, lines: Vec<JournalLine>) -> JournalVoucher {
        JournalVoucher::new(header(no, 1, day), lines).user_remark(format!("Test {no}"))
    }

    /// A one-line sales invoice to Globex.
    pub fn sales_invoice(&self, no: &str, amount: Decimal) -> SalesInvoice {
        SalesInvoice::new(header(no, 1, 15), "Globex", self.debtors, amount).item(self.sales, amount, CC)
    }

    /// A one-line purchase invoice from Initech.
    pub fn purchase_invoice(&self, no: &str, amount: Decimal) -> PurchaseInvoice {
        PurchaseInvoice::new(header(no, 1, 15), "Initech", self.creditors, amount).item(self.purchases, amount, CC)
    }

    /// A receipt from Globex left on-account.
    pub fn receipt(&self, no: &str, day: u32, amount: Decimal) -> JournalVoucher {
        self.journal(
            no,
            day,
            vec![
                JournalLine::debit(self.bank, amount),
                JournalLine::credit(self.debtors, amount).party("Globex").advance(),
            ],
        )
    }

    /// A receipt from Globex settling `invoice`.
    pub fn payment_against(&self, no: &str, invoice: &str, amount: Decimal) -> JournalVoucher {
        self.journal(
            no,
            20,
            vec![
                JournalLine::debit(self.bank, amount),
                JournalLine::credit(self.debtors, amount)
                    .party("Globex")
                    .against(VoucherKey::new(VoucherType::SalesInvoice, invoice)),
            ],
        )
    }

    pub fn outstanding(&self, invoice: &str) -> Decimal {
        self.ledger
            .get_outstanding(VoucherType::SalesInvoice, invoice, Some("Globex"))
    }

    pub fn balance(&self, account: AccountId) -> Decimal {
        self.ledger.get_balance(account, None).unwrap()
    }
}
