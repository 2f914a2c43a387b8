//! A set of rows and document updates committed together.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::locks::LockKey;
use crate::accounts::AccountTree;
use crate::ledger::entry::LedgerEntry;
use crate::ledger::types::{DocStatus, OutstandingKey, VoucherKey};
use crate::voucher::Voucher;

/// Everything one operation writes.
///
/// Plans are built without holding keyed locks, then rebuilt once the locks
/// named by the first build are held. A commit only proceeds when the
/// rebuilt plan needs no lock beyond those.
#[derive(Debug, Default)]
pub(crate) struct CommitPlan {
    /// Rows to append, mirrors included.
    pub rows: Vec<LedgerEntry>,
    /// Document records to store after the rows are appended.
    pub documents: Vec<(Voucher, DocStatus)>,
    /// Original of an amendment being submitted, and the amendment number.
    pub amendment_of: Option<(VoucherKey, String)>,
    /// Vouchers whose status or rows this plan changes.
    pub vouchers: BTreeSet<VoucherKey>,
    /// Outstanding checks run in cancellation context.
    pub on_cancel: bool,
    /// Re-post made by reconciliation; balance-sign checks are skipped.
    pub adv_adj: bool,
    /// Credit limit per (company, customer) the rows must keep to.
    pub credit_limits: BTreeMap<(String, String), Decimal>,
    /// (company, party) pairs whose postings this plan serializes with.
    pub parties: BTreeSet<(String, String)>,
}

impl CommitPlan {
    pub fn new(on_cancel: bool, adv_adj: bool) -> Self {
        Self {
            on_cancel,
            adv_adj,
            ..Self::default()
        }
    }

    /// Adds rows and marks their voucher as changed.
    pub fn push_rows(&mut self, rows: impl IntoIterator<Item = LedgerEntry>) {
        for row in rows {
            self.vouchers.insert(row.voucher.clone());
            self.rows.push(row);
        }
    }

    /// Stores `voucher` with `status` on commit.
    pub fn store_document(&mut self, voucher: Voucher, status: DocStatus) {
        self.vouchers.insert(voucher.key());
        self.documents.push((voucher, status));
    }

    /// Outstanding amounts the rows affect.
    ///
    /// Outstanding is tracked per party; a reference without a party settles
    /// nothing.
    pub fn outstanding_keys(&self) -> BTreeSet<OutstandingKey> {
        self.rows
            .iter()
            .filter_map(|row| match (&row.against, &row.party) {
                (Some(against), Some(party)) => Some(OutstandingKey::new(against.clone(), Some(party.clone()))),
                _ => None,
            })
            .collect()
    }

    /// Requires every customer the rows debit to stay within `limit_of`.
    pub fn limit_credit(&mut self, limit_of: impl Fn(&str, &str) -> Option<Decimal>) {
        let mut debited: BTreeMap<(String, String), Decimal> = BTreeMap::new();
        for row in &self.rows {
            if let Some(party) = &row.party {
                *debited.entry((row.company.clone(), party.clone())).or_default() += row.net();
            }
        }
        for ((company, party), net) in debited {
            if net <= Decimal::ZERO {
                continue;
            }
            if let Some(limit) = limit_of(&party, &company) {
                self.parties.insert((company.clone(), party.clone()));
                self.credit_limits.insert((company, party), limit);
            }
        }
    }

    /// Net change per account.
    pub fn deltas(&self) -> BTreeMap<AccountId, Decimal> {
        let mut deltas = BTreeMap::new();
        for row in &self.rows {
            *deltas.entry(row.account).or_insert(Decimal::ZERO) += row.net();
        }
        deltas
    }

    /// Keys to hold while committing: every changed or referenced voucher,
    /// every party named in `parties` and every posted account with a
    /// required balance sign.
    pub fn lock_keys(&self, tree: &AccountTree) -> BTreeSet<LockKey> {
        let mut keys: BTreeSet<LockKey> = self.vouchers.iter().cloned().map(LockKey::Voucher).collect();
        keys.extend(
            self.outstanding_keys()
                .into_iter()
                .map(|key| LockKey::Voucher(key.against)),
        );
        keys.extend(
            self.parties
                .iter()
                .map(|(company, party)| LockKey::Party(company.clone(), party.clone())),
        );
        if let Some((original, _)) = &self.amendment_of {
            keys.insert(LockKey::Voucher(original.clone()));
        }
        keys.extend(
            self.deltas()
                .into_keys()
                .filter(|id| tree.get(*id).is_some_and(|a| a.balance_must_be.is_some()))
                .map(LockKey::Account),
        );
        keys
    }
}
