//! Tally demo seeder
//!
//! Builds a small chart of accounts, posts a handful of vouchers through the
//! engine and logs the resulting trial balance.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::GeneralLedger;
use tally_core::accounts::{AccountType, BalanceMustBe, NewAccount, NormalBalance, ReportType};
use tally_core::ledger::{VoucherKey, VoucherType};
use tally_core::masters::{FiscalYear, Party};
use tally_core::voucher::{
    AdvanceAllocation, JournalLine, JournalVoucher, PeriodClosingVoucher, SalesInvoice, TaxLine,
    VoucherHeader,
};
use tally_shared::AppConfig;
use tally_shared::types::{AccountId, RoleSet};

const COMPANY: &str = "Acme Trading";
const COST_CENTER: &str = "Main - AT";

struct Chart {
    bank: AccountId,
    cash: AccountId,
    debtors: AccountId,
    vat: AccountId,
    retained: AccountId,
    sales: AccountId,
    rent: AccountId,
}

fn date(month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, month, day)
        .ok_or_else(|| anyhow::anyhow!("invalid date 2024-{month}-{day}"))
}

fn header(no: &str, month: u32, day: u32) -> anyhow::Result<VoucherHeader> {
    Ok(VoucherHeader::new(no, COMPANY, date(month, day)?, "2024"))
}

fn seed_chart(ledger: &GeneralLedger) -> anyhow::Result<Chart> {
    let assets = ledger.insert_account(
        NewAccount::group("Application of Funds (Assets)", COMPANY).report_type(ReportType::BalanceSheet),
    )?;
    let current = ledger.insert_account(NewAccount::group("Current Assets", COMPANY).under(assets))?;
    let bank = ledger.insert_account(
        NewAccount::ledger("Bank", COMPANY)
            .under(current)
            .account_type(AccountType::Bank)
            .balance_must_be(BalanceMustBe::Debit),
    )?;
    let cash = ledger.insert_account(NewAccount::ledger("Cash", COMPANY).under(current).account_type(AccountType::Cash))?;
    let debtors = ledger.insert_account(
        NewAccount::ledger("Debtors", COMPANY)
            .under(current)
            .account_type(AccountType::Receivable),
    )?;

    let liabilities = ledger.insert_account(
        NewAccount::group("Source of Funds (Liabilities)", COMPANY)
            .report_type(ReportType::BalanceSheet)
            .normal_balance(NormalBalance::Credit),
    )?;
    let vat = ledger.insert_account(NewAccount::ledger("VAT Payable", COMPANY).under(liabilities).account_type(AccountType::Tax))?;
    let retained = ledger.insert_account(NewAccount::ledger("Retained Earnings", COMPANY).under(liabilities))?;

    let income = ledger.insert_account(
        NewAccount::group("Income", COMPANY)
            .report_type(ReportType::ProfitAndLoss)
            .normal_balance(NormalBalance::Credit),
    )?;
    let sales = ledger.insert_account(NewAccount::ledger("Sales", COMPANY).under(income).account_type(AccountType::Income))?;
    let expenses = ledger.insert_account(NewAccount::group("Expenses", COMPANY).report_type(ReportType::ProfitAndLoss))?;
    let rent = ledger.insert_account(NewAccount::ledger("Rent", COMPANY).under(expenses).account_type(AccountType::Expense))?;

    Ok(Chart {
        bank,
        cash,
        debtors,
        vat,
        retained,
        sales,
        rent,
    })
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally_core=info,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let ledger = GeneralLedger::from_config(&config);
    let roles: RoleSet = config.accounts.frozen_accounts_modifier.iter().cloned().collect();

    ledger.add_fiscal_year(FiscalYear::new("2024", date(1, 1)?, date(12, 31)?))?;
    ledger.add_cost_center(COST_CENTER, COMPANY);
    ledger.register_party(Party::customer("Globex"));

    let chart = seed_chart(&ledger)?;
    info!(company = COMPANY, "Chart of accounts seeded");

    // Opening cash sale
    let opening = JournalVoucher::new(
        header("JV-0001", 1, 2)?,
        vec![
            JournalLine::debit(chart.cash, Decimal::new(500, 0)),
            JournalLine::credit(chart.sales, Decimal::new(500, 0)).cost_center(COST_CENTER),
        ],
    )
    .user_remark("Cash sale");
    ledger.submit(opening.into(), &roles)?;

    // Customer pays in advance
    let advance = JournalVoucher::new(
        header("JV-0002", 1, 5)?,
        vec![
            JournalLine::debit(chart.bank, Decimal::new(400, 0)),
            JournalLine::credit(chart.debtors, Decimal::new(400, 0)).party("Globex").advance(),
        ],
    )
    .user_remark("Advance from Globex");
    ledger.submit(advance.into(), &roles)?;

    // Invoice consuming the advance
    let invoice = SalesInvoice::new(header("INV-0001", 1, 15)?, "Globex", chart.debtors, Decimal::new(1100, 0))
        .item(chart.sales, Decimal::new(1000, 0), COST_CENTER)
        .tax(TaxLine::add(chart.vat, Decimal::new(100, 0)))
        .advance(AdvanceAllocation::new("JV-0002", 1, Decimal::new(400, 0), Decimal::new(400, 0)));
    let invoice_key = VoucherKey::new(VoucherType::SalesInvoice, "INV-0001");
    ledger.submit(invoice.into(), &roles)?;

    // Settle the rest through the bank
    let payment = ledger.make_payment_entry(&invoice_key, chart.bank, header("JV-0003", 1, 20)?, "CHQ-1001")?;
    ledger.submit(payment.into(), &roles)?;
    info!(
        outstanding = %ledger.get_outstanding(invoice_key.voucher_type, &invoice_key.voucher_no, Some("Globex")),
        "Invoice settled"
    );

    let rent = JournalVoucher::new(
        header("JV-0004", 2, 1)?,
        vec![
            JournalLine::debit(chart.rent, Decimal::new(300, 0)).cost_center(COST_CENTER),
            JournalLine::credit(chart.bank, Decimal::new(300, 0)),
        ],
    )
    .user_remark("February rent");
    ledger.submit(rent.into(), &roles)?;

    let closing = PeriodClosingVoucher::new(header("PCV-2024", 12, 31)?, chart.retained);
    ledger.submit(closing.into(), &roles)?;

    let report = ledger.trial_balance(COMPANY, None)?;
    info!(
        debit = %report.totals.total_debit,
        credit = %report.totals.total_credit,
        balanced = report.totals.is_balanced,
        "Trial balance"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
