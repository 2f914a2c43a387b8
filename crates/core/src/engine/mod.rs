//! The posting engine.
//!
//! [`GeneralLedger`] owns the chart of accounts, the ledger log, the document
//! registry and the master data. Every operation that writes rows follows the
//! same shape:
//!
//! 1. take the tree read lock (structural edits take the write lock)
//! 2. build a [`plan::CommitPlan`] and acquire the keyed locks it names
//! 3. rebuild the plan under those locks and check outstanding, credit limits
//!    and balance signs
//! 4. append the rows and update the documents
//!
//! Lock contention is retried with backoff, then surfaced as a transient error.

mod admin;
pub(crate) mod locks;
pub(crate) mod plan;
mod posting;
mod reconcile;

use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, DebitCredit};
use tally_shared::{AppConfig, EngineConfig, PeriodConfig};
use tracing::{debug, warn};

use crate::accounts::{Account, AccountTree};
use crate::ledger::balance::{AccountBalance, BalanceIndex};
use crate::ledger::entry::LedgerEntry;
use crate::ledger::error::LedgerError;
use crate::ledger::store::LedgerStore;
use crate::ledger::types::{DocStatus, OutstandingKey, VoucherKey, VoucherType};
use crate::masters::MasterData;
use crate::period::PeriodGuard;
use crate::reconciliation::OutstandingCalculator;
use crate::reports::{ReportService, TrialBalanceReport, TrialBalanceRow};
use crate::voucher::{DocumentSnapshot, PostingContext, Voucher};

use locks::LockTable;
use plan::CommitPlan;

pub use locks::LockKey;

/// A voucher known to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// The document as last posted.
    pub voucher: Voucher,
    /// Current status.
    pub status: DocStatus,
    /// Number of the amendment made from this voucher, if any.
    pub amended_by: Option<String>,
    /// Outstanding amount, for documents other rows reference.
    pub outstanding: Option<Decimal>,
}

/// Rows written by a submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedEntrySet {
    /// The submitted voucher.
    pub voucher: VoucherKey,
    /// Its rows, with sequence numbers.
    pub entries: Vec<LedgerEntry>,
    /// Debit and credit totals of the rows.
    pub totals: DebitCredit,
}

/// The general ledger.
#[derive(Debug)]
pub struct GeneralLedger {
    period: PeriodConfig,
    config: EngineConfig,
    tree: RwLock<AccountTree>,
    masters: RwLock<MasterData>,
    store: LedgerStore,
    documents: DashMap<VoucherKey, DocumentRecord>,
    locks: LockTable,
}

impl GeneralLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new(period: PeriodConfig, config: EngineConfig) -> Self {
        Self {
            period,
            config,
            tree: RwLock::new(AccountTree::new()),
            masters: RwLock::new(MasterData::new()),
            store: LedgerStore::new(),
            documents: DashMap::new(),
            locks: LockTable::new(),
        }
    }

    /// Creates an empty ledger from loaded settings.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.accounts.clone(), config.engine.clone())
    }

    /// Accounts settings in effect.
    #[must_use]
    pub const fn period_config(&self) -> &PeriodConfig {
        &self.period
    }

    /// The ledger log.
    #[must_use]
    pub const fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// A copy of a registered document.
    #[must_use]
    pub fn document(&self, key: &VoucherKey) -> Option<DocumentRecord> {
        self.documents.get(key).map(|record| record.value().clone())
    }

    /// A copy of an account.
    pub fn account(&self, id: AccountId) -> Result<Account, LedgerError> {
        let tree = self.read_tree()?;
        tree.get(id).cloned().ok_or(LedgerError::AccountNotFound(id))
    }

    /// Looks an account up by name.
    pub fn find_account(&self, name: &str, company: &str) -> Result<Option<Account>, LedgerError> {
        Ok(self.read_tree()?.find_by_name(name, company).cloned())
    }

    // ========================================================================
    // Balances and reports
    // ========================================================================

    /// Balance up to `as_of` (all dates if `None`) in the account's natural
    /// sign: debit minus credit for debit-normal accounts, credit minus debit
    /// for credit-normal ones. For a group, the sum over its subtree in the
    /// group's sign.
    pub fn get_balance(&self, account: AccountId, as_of: Option<NaiveDate>) -> Result<Decimal, LedgerError> {
        let tree = self.read_tree()?;
        let node = tree.get(account).ok_or(LedgerError::AccountNotFound(account))?;
        let ids: Vec<AccountId> = if node.is_group {
            tree.descendants(account)
                .into_iter()
                .filter(|a| !a.is_group)
                .map(|a| a.id)
                .collect()
        } else {
            vec![account]
        };
        Ok(node.natural_sign(self.store.accounts_totals(&ids, as_of).net()))
    }

    /// Outstanding amount of a document for a party.
    #[must_use]
    pub fn get_outstanding(&self, voucher_type: VoucherType, voucher_no: &str, party: Option<&str>) -> Decimal {
        let key = OutstandingKey::new(VoucherKey::new(voucher_type, voucher_no), party.map(str::to_string));
        let (against, on_account) = self.store.outstanding_totals(&key);
        OutstandingCalculator::compute(&key, against, on_account)
    }

    /// Debit and credit totals of every ledger account of a company.
    pub fn trial_balance(&self, company: &str, as_of: Option<NaiveDate>) -> Result<TrialBalanceReport, LedgerError> {
        let tree = self.read_tree()?;
        let rows = tree
            .ledgers(company)
            .into_iter()
            .map(|account| {
                let totals = AccountBalance::new(account.id, self.store.account_totals(account.id, as_of));
                TrialBalanceRow {
                    account: account.id,
                    name: account.name.clone(),
                    report_type: account.report_type,
                    debit_total: totals.debit_total,
                    credit_total: totals.credit_total,
                    balance: account.natural_sign(totals.net()),
                }
            })
            .filter(|row| !row.debit_total.is_zero() || !row.credit_total.is_zero())
            .collect();
        Ok(ReportService::generate_trial_balance(company, as_of, rows))
    }

    // ========================================================================
    // Locking
    // ========================================================================

    fn read_tree(&self) -> Result<RwLockReadGuard<'_, AccountTree>, LedgerError> {
        self.tree
            .try_read_for(self.config.lock_timeout())
            .ok_or(LedgerError::LockContention { attempts: 1 })
    }

    fn write_tree(&self) -> Result<RwLockWriteGuard<'_, AccountTree>, LedgerError> {
        self.tree
            .try_write_for(self.config.lock_timeout())
            .ok_or(LedgerError::LockContention { attempts: 1 })
    }

    /// Runs `op` until it succeeds, fails for a non-transient reason or the
    /// attempts run out.
    fn with_retry<T>(&self, operation: &str, mut op: impl FnMut() -> Result<T, LedgerError>) -> Result<T, LedgerError> {
        let attempts = self.config.lock_attempts.max(1);
        for attempt in 0..attempts {
            match op() {
                Err(err) if err.is_retryable() => {
                    let backoff = self.config.backoff(attempt);
                    warn!(operation, attempt = attempt + 1, ?backoff, "Lock contention, retrying");
                    std::thread::sleep(backoff);
                }
                result => return result,
            }
        }
        Err(LedgerError::LockContention { attempts })
    }

    /// Builds a plan, locks what it names, rebuilds it under the locks and
    /// commits it.
    fn run<F>(&self, operation: &str, build: F) -> Result<Vec<LedgerEntry>, LedgerError>
    where
        F: Fn(&EngineContext<'_>) -> Result<CommitPlan, LedgerError>,
    {
        self.with_retry(operation, || {
            let tree = self.read_tree()?;
            let ctx = EngineContext { engine: self, tree: &tree };

            let draft = build(&ctx)?;
            let held = self
                .locks
                .acquire(draft.lock_keys(&tree), self.config.lock_timeout())?;

            let plan = build(&ctx)?;
            if !held.covers(&plan.lock_keys(&tree)) {
                debug!(operation, "Plan changed while locking");
                return Err(LedgerError::LockContention { attempts: 1 });
            }
            self.commit(&tree, plan)
        })
    }

    /// Checks outstanding amounts and balance signs the plan would produce,
    /// then writes it. Caller holds the plan's keyed locks.
    fn commit(&self, tree: &AccountTree, plan: CommitPlan) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut pending = BalanceIndex::new();
        pending.apply(&plan.rows);

        let mut outstanding = Vec::new();
        for key in plan.outstanding_keys() {
            let (stored_against, stored_on_account) = self.store.outstanding_totals(&key);
            let against = stored_against + pending.against_totals(&key);
            let on_account =
                stored_on_account + pending.on_account_totals(&key.against, key.party.as_deref());
            let bal = OutstandingCalculator::compute(&key, against, on_account);
            outstanding.push((key.clone(), OutstandingCalculator::check(&key, bal, plan.on_cancel)?));
        }

        for ((company, party), credit_limit) in &plan.credit_limits {
            let totals = self.store.party_totals(company, party) + pending.party_totals(company, party);
            if totals.net() > *credit_limit {
                return Err(LedgerError::CreditLimitExceeded {
                    party: party.clone(),
                    outstanding: totals.net(),
                    credit_limit: *credit_limit,
                });
            }
        }

        let guard = PeriodGuard::new(&self.period);
        for (id, delta) in plan.deltas() {
            let account = tree.get(id).ok_or(LedgerError::AccountNotFound(id))?;
            let current = self.store.account_totals(id, None).net();
            guard.validate_balance_type(account, current, delta, plan.adv_adj)?;
        }

        let committed = self.store.append(plan.rows);

        for (voucher, status) in plan.documents {
            let key = voucher.key();
            let mut record = self.documents.entry(key).or_insert_with(|| DocumentRecord {
                voucher: voucher.clone(),
                status,
                amended_by: None,
                outstanding: None,
            });
            record.voucher = voucher;
            record.status = status;
        }
        if let Some((original, amendment)) = plan.amendment_of {
            if let Some(mut record) = self.documents.get_mut(&original) {
                record.amended_by = Some(amendment);
            }
        }
        for (key, amount) in outstanding {
            if let Some(mut record) = self.documents.get_mut(&key.against) {
                if record.voucher.party() == key.party.as_deref() {
                    record.outstanding = Some(amount);
                }
            }
        }
        Ok(committed)
    }
}

/// Read access used while validating and planning.
pub(crate) struct EngineContext<'a> {
    engine: &'a GeneralLedger,
    tree: &'a AccountTree,
}

impl EngineContext<'_> {
    fn masters(&self) -> RwLockReadGuard<'_, MasterData> {
        self.engine.masters.read()
    }
}

impl PostingContext for EngineContext<'_> {
    fn account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.tree.get(id).cloned().ok_or(LedgerError::AccountNotFound(id))
    }

    fn document(&self, key: &VoucherKey) -> Option<DocumentSnapshot> {
        self.engine.documents.get(key).map(|record| DocumentSnapshot {
            status: record.status,
            voucher: record.voucher.clone(),
        })
    }

    fn ledger_accounts(&self, company: &str) -> Vec<Account> {
        self.tree.ledgers(company).into_iter().cloned().collect()
    }

    fn account_net(&self, id: AccountId, as_of: NaiveDate) -> Decimal {
        self.engine.store.account_totals(id, Some(as_of)).net()
    }

    fn submitted(&self, voucher_type: VoucherType) -> Vec<Voucher> {
        self.engine
            .documents
            .iter()
            .filter(|record| record.status == DocStatus::Submitted && record.voucher.voucher_type() == voucher_type)
            .map(|record| record.voucher.clone())
            .collect()
    }
}
