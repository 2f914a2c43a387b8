//! Report generation service.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::types::{TrialBalanceReport, TrialBalanceRow, TrialBalanceTotals};

/// Service for generating financial reports.
pub struct ReportService;

impl ReportService {
    /// Generates a trial balance report from per-account totals.
    ///
    /// The trial balance verifies that total debits equal total credits.
    #[must_use]
    pub fn generate_trial_balance(
        company: &str,
        as_of: Option<NaiveDate>,
        rows: Vec<TrialBalanceRow>,
    ) -> TrialBalanceReport {
        let total_debit: Decimal = rows.iter().map(|r| r.debit_total).sum();
        let total_credit: Decimal = rows.iter().map(|r| r.credit_total).sum();

        TrialBalanceReport {
            company: company.to_string(),
            as_of,
            rows,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
                is_balanced: total_debit == total_credit,
            },
        }
    }
}
