//! Business rule validation for ledger rows and entry sets.

use rust_decimal::Decimal;
use tally_shared::types::{DebitCredit, round_amount};

use super::entry::LedgerEntry;
use super::error::LedgerError;
use super::types::{VoucherKey, VoucherType};
use crate::accounts::{Account, ReportType};
use crate::masters::MasterData;

/// Validates one row against its account and the reference data.
///
/// Amounts are rounded to posting precision in place, and the cost center is
/// cleared on balance-sheet rows.
///
/// # Errors
///
/// Returns the first failed check.
pub fn validate_row(
    entry: &mut LedgerEntry,
    account: &Account,
    masters: &MasterData,
) -> Result<(), LedgerError> {
    if entry.remarks.trim().is_empty() {
        return Err(LedgerError::MissingField { field: "remarks" });
    }

    entry.debit = round_amount(entry.debit);
    entry.credit = round_amount(entry.credit);
    if entry.debit < Decimal::ZERO || entry.credit < Decimal::ZERO {
        return Err(LedgerError::NegativeAmount {
            account: account.name.clone(),
        });
    }
    if !entry.debit.is_zero() && !entry.credit.is_zero() {
        return Err(LedgerError::BothDebitAndCredit {
            account: account.name.clone(),
        });
    }
    if entry.debit.is_zero() && entry.credit.is_zero() {
        return Err(LedgerError::ZeroAmount {
            account: account.name.clone(),
        });
    }

    if account.is_group {
        return Err(LedgerError::GroupAccountPosting {
            account: account.name.clone(),
        });
    }
    if account.disabled {
        return Err(LedgerError::AccountDisabled {
            account: account.name.clone(),
        });
    }
    if account.company != entry.company {
        return Err(LedgerError::AccountCompanyMismatch {
            account: account.name.clone(),
            company: entry.company.clone(),
        });
    }

    match account.report_type {
        ReportType::ProfitAndLoss => {
            if entry.is_opening {
                return Err(LedgerError::OpeningOnProfitAndLoss {
                    account: account.name.clone(),
                });
            }
            let closing = entry.voucher.voucher_type == VoucherType::PeriodClosingVoucher;
            match entry.cost_center.as_deref() {
                Some(cost_center) => masters.validate_cost_center(cost_center, &entry.company)?,
                None if !closing => {
                    return Err(LedgerError::CostCenterRequired {
                        account: account.name.clone(),
                    });
                }
                None => {}
            }
        }
        ReportType::BalanceSheet => entry.cost_center = None,
    }

    if let Some(party) = entry.party.as_deref() {
        masters.validate_party(party)?;
    }
    Ok(())
}

/// Validates that a set of rows is non-empty and balanced.
///
/// Rows must already be rounded by [`validate_row`]; the sums are compared
/// exactly.
///
/// # Errors
///
/// `NoEntries` or `Unbalanced`.
pub fn validate_entries(
    voucher: &VoucherKey,
    entries: &[LedgerEntry],
) -> Result<DebitCredit, LedgerError> {
    if entries.is_empty() {
        return Err(LedgerError::NoEntries(voucher.clone()));
    }

    let totals: DebitCredit = entries.iter().map(LedgerEntry::amount).sum();
    if totals.debit != totals.credit {
        return Err(LedgerError::Unbalanced {
            voucher: voucher.clone(),
            debit: totals.debit,
            credit: totals.credit,
        });
    }
    Ok(totals)
}
