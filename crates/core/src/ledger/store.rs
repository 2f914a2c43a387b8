//! Append-only ledger log with its indexes.
//!
//! Rows and every derived aggregate live behind one `RwLock`, so a commit
//! becomes visible to readers all at once.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use parking_lot::RwLock;
use tally_shared::types::{AccountId, DebitCredit, EntryId};

use super::balance::BalanceIndex;
use super::entry::LedgerEntry;
use super::types::{OutstandingKey, VoucherKey};

#[derive(Debug, Default)]
struct LedgerState {
    rows: Vec<LedgerEntry>,
    by_voucher: HashMap<VoucherKey, Vec<usize>>,
    by_account: HashMap<AccountId, Vec<usize>>,
    reversed: HashSet<EntryId>,
    balances: BalanceIndex,
}

impl LedgerState {
    fn rows_of<'a>(&'a self, positions: Option<&'a Vec<usize>>) -> impl Iterator<Item = &'a LedgerEntry> {
        positions
            .into_iter()
            .flatten()
            .filter_map(|pos| self.rows.get(*pos))
    }
}

/// The general ledger log.
#[derive(Debug, Default)]
pub struct LedgerStore {
    state: RwLock<LedgerState>,
}

impl LedgerStore {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a validated set, assigning sequence numbers, and updates the index.
    ///
    /// Returns the committed rows.
    pub fn append(&self, entries: Vec<LedgerEntry>) -> Vec<LedgerEntry> {
        let mut state = self.state.write();
        let mut committed = Vec::with_capacity(entries.len());
        for mut entry in entries {
            let pos = state.rows.len();
            entry.seq = pos as u64 + 1;
            state.by_voucher.entry(entry.voucher.clone()).or_default().push(pos);
            state.by_account.entry(entry.account).or_default().push(pos);
            if let Some(original) = entry.reverses {
                state.reversed.insert(original);
            }
            committed.push(entry.clone());
            state.rows.push(entry);
        }
        state.balances.apply(&committed);
        committed
    }

    /// Number of rows in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().rows.len()
    }

    /// Returns true if nothing was ever posted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every row posted by a voucher, reversals included, in log order.
    #[must_use]
    pub fn voucher_entries(&self, voucher: &VoucherKey) -> Vec<LedgerEntry> {
        let state = self.state.read();
        state.rows_of(state.by_voucher.get(voucher)).cloned().collect()
    }

    /// Rows of a voucher that are neither reversals nor reversed yet.
    #[must_use]
    pub fn active_entries(&self, voucher: &VoucherKey) -> Vec<LedgerEntry> {
        let state = self.state.read();
        state
            .rows_of(state.by_voucher.get(voucher))
            .filter(|e| !e.is_reversal() && !state.reversed.contains(&e.id))
            .cloned()
            .collect()
    }

    /// Live rows of other vouchers that reference `against`.
    #[must_use]
    pub fn active_entries_against(&self, against: &VoucherKey) -> Vec<LedgerEntry> {
        let state = self.state.read();
        state
            .rows
            .iter()
            .filter(|e| {
                e.against.as_ref() == Some(against)
                    && &e.voucher != against
                    && !e.is_reversal()
                    && !state.reversed.contains(&e.id)
            })
            .cloned()
            .collect()
    }

    /// Returns true if any row references the account.
    #[must_use]
    pub fn has_entries(&self, account: AccountId) -> bool {
        self.state
            .read()
            .by_account
            .get(&account)
            .is_some_and(|rows| !rows.is_empty())
    }

    /// Every row posted to an account, in log order.
    #[must_use]
    pub fn account_entries(&self, account: AccountId) -> Vec<LedgerEntry> {
        let state = self.state.read();
        state.rows_of(state.by_account.get(&account)).cloned().collect()
    }

    /// Account totals as of a date (all dates if `None`).
    #[must_use]
    pub fn account_totals(&self, account: AccountId, as_of: Option<NaiveDate>) -> DebitCredit {
        self.state.read().balances.account_totals(account, as_of)
    }

    /// Summed totals of several accounts, read under one lock.
    #[must_use]
    pub fn accounts_totals(&self, accounts: &[AccountId], as_of: Option<NaiveDate>) -> DebitCredit {
        let state = self.state.read();
        accounts
            .iter()
            .map(|account| state.balances.account_totals(*account, as_of))
            .sum()
    }

    /// Totals of rows referencing a document for a party, and of the
    /// document's own unlinked rows for that party, read under one lock.
    #[must_use]
    pub fn outstanding_totals(&self, key: &OutstandingKey) -> (DebitCredit, DebitCredit) {
        let state = self.state.read();
        (
            state.balances.against_totals(key),
            state.balances.on_account_totals(&key.against, key.party.as_deref()),
        )
    }

    /// Totals of every row a party carries in a company.
    #[must_use]
    pub fn party_totals(&self, company: &str, party: &str) -> DebitCredit {
        self.state.read().balances.party_totals(company, party)
    }

    /// Moves every row of `from` to `into`.
    ///
    /// Only used when two accounts are merged: the surviving account takes
    /// over the merged account's history. Returns the number of rows moved.
    pub fn reassign_account(&self, from: AccountId, into: AccountId) -> usize {
        let mut state = self.state.write();
        let Some(positions) = state.by_account.remove(&from) else {
            return 0;
        };
        for pos in &positions {
            if let Some(row) = state.rows.get_mut(*pos) {
                row.account = into;
            }
        }
        let moved = positions.len();
        let target = state.by_account.entry(into).or_default();
        target.extend(positions);
        target.sort_unstable();
        state.balances.merge_account(from, into);
        moved
    }
}
