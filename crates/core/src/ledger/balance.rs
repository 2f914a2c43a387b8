//! Balance aggregates derived from ledger rows.
//!
//! The index is rebuilt incrementally: every committed row (original or
//! reversal) is added once, so a reversal cancels its original exactly.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, DebitCredit};

use super::entry::LedgerEntry;
use super::types::{OutstandingKey, VoucherKey};

/// Debit/credit totals of one account as of a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account.
    pub account: AccountId,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
}

impl AccountBalance {
    /// Creates a balance from totals.
    #[must_use]
    pub const fn new(account: AccountId, totals: DebitCredit) -> Self {
        Self {
            account,
            debit_total: totals.debit,
            credit_total: totals.credit,
        }
    }

    /// Debit minus credit.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.debit_total - self.credit_total
    }
}

/// Aggregates maintained alongside the ledger log.
#[derive(Debug, Clone, Default)]
pub struct BalanceIndex {
    /// Per account, per posting date.
    accounts: HashMap<AccountId, BTreeMap<NaiveDate, DebitCredit>>,
    /// Rows referencing an against-voucher, per (against, party).
    against: HashMap<OutstandingKey, DebitCredit>,
    /// Rows without an against-voucher, per (own voucher, party).
    on_account: HashMap<OutstandingKey, DebitCredit>,
    /// Rows carrying a party, per (company, party).
    parties: HashMap<(String, String), DebitCredit>,
}

impl BalanceIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds committed rows to the aggregates.
    pub fn apply<'a>(&mut self, entries: impl IntoIterator<Item = &'a LedgerEntry>) {
        for entry in entries {
            *self
                .accounts
                .entry(entry.account)
                .or_default()
                .entry(entry.posting_date)
                .or_default() += entry.amount();

            let bucket = match &entry.against {
                Some(against) => self
                    .against
                    .entry(OutstandingKey::new(against.clone(), entry.party.clone())),
                None => self
                    .on_account
                    .entry(OutstandingKey::new(entry.voucher.clone(), entry.party.clone())),
            };
            *bucket.or_default() += entry.amount();

            if let Some(party) = &entry.party {
                *self
                    .parties
                    .entry((entry.company.clone(), party.clone()))
                    .or_default() += entry.amount();
            }
        }
    }

    /// Totals of an account up to and including `as_of` (all dates if `None`).
    #[must_use]
    pub fn account_totals(&self, account: AccountId, as_of: Option<NaiveDate>) -> DebitCredit {
        let Some(by_date) = self.accounts.get(&account) else {
            return DebitCredit::ZERO;
        };
        match as_of {
            Some(date) => by_date.range(..=date).map(|(_, dc)| *dc).sum(),
            None => by_date.values().copied().sum(),
        }
    }

    /// Totals of rows referencing `key.against` for `key.party`.
    #[must_use]
    pub fn against_totals(&self, key: &OutstandingKey) -> DebitCredit {
        self.against.get(key).copied().unwrap_or_default()
    }

    /// Totals of a voucher's own unlinked rows for a party.
    #[must_use]
    pub fn on_account_totals(&self, voucher: &VoucherKey, party: Option<&str>) -> DebitCredit {
        self.on_account
            .get(&OutstandingKey::new(voucher.clone(), party.map(str::to_string)))
            .copied()
            .unwrap_or_default()
    }

    /// Totals of every row a party carries in a company.
    #[must_use]
    pub fn party_totals(&self, company: &str, party: &str) -> DebitCredit {
        self.parties
            .get(&(company.to_string(), party.to_string()))
            .copied()
            .unwrap_or_default()
    }

    /// Folds one account's aggregates into another.
    pub fn merge_account(&mut self, from: AccountId, into: AccountId) {
        let Some(moved) = self.accounts.remove(&from) else {
            return;
        };
        let target = self.accounts.entry(into).or_default();
        for (date, totals) in moved {
            *target.entry(date).or_default() += totals;
        }
    }
}
