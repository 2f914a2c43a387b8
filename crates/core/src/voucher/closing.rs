//! Period closing: moves the profit and loss balances of a company into a
//! balance sheet account.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, DebitCredit};

use super::{PostingContext, Postable, VoucherHeader};
use crate::accounts::ReportType;
use crate::ledger::entry::EntryDraft;
use crate::ledger::error::LedgerError;
use crate::ledger::types::VoucherType;

/// Closes every P&L ledger of the company as of the posting date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodClosingVoucher {
    /// Common header.
    pub header: VoucherHeader,
    /// Balance sheet account receiving the net profit or loss.
    pub closing_account: AccountId,
}

impl PeriodClosingVoucher {
    /// Creates a closing voucher.
    #[must_use]
    pub const fn new(header: VoucherHeader, closing_account: AccountId) -> Self {
        Self {
            header,
            closing_account,
        }
    }
}

impl Postable for PeriodClosingVoucher {
    fn header(&self) -> &VoucherHeader {
        &self.header
    }

    fn voucher_type(&self) -> VoucherType {
        VoucherType::PeriodClosingVoucher
    }

    fn validate(&self, ctx: &dyn PostingContext) -> Result<(), LedgerError> {
        let account = ctx.account(self.closing_account)?;
        if account.report_type != ReportType::BalanceSheet {
            return Err(LedgerError::invalid(
                &self.key(),
                format!("Closing account {} must be a Balance Sheet account", account.name),
            ));
        }
        if account.company != self.header.company {
            return Err(LedgerError::AccountCompanyMismatch {
                account: account.name,
                company: self.header.company.clone(),
            });
        }
        Ok(())
    }

    fn gl_entries(&self, ctx: &dyn PostingContext) -> Result<Vec<EntryDraft>, LedgerError> {
        let mut rows = Vec::new();
        let mut net = Decimal::ZERO;
        for account in ctx.ledger_accounts(&self.header.company) {
            if account.report_type != ReportType::ProfitAndLoss || account.disabled {
                continue;
            }
            let balance = ctx.account_net(account.id, self.header.posting_date);
            if balance.is_zero() {
                continue;
            }
            net += balance;
            rows.push(EntryDraft::new(account.id, DebitCredit::from_net(balance).swapped()));
        }
        if !net.is_zero() {
            rows.push(EntryDraft::new(self.closing_account, DebitCredit::from_net(net)));
        }
        Ok(rows)
    }
}
