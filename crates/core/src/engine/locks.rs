//! Keyed locks taken by postings.
//!
//! Keys are always acquired in sorted order, each with a bounded wait. A
//! timeout releases everything already held and reports contention so the
//! caller can retry.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use tally_shared::types::AccountId;
use tracing::debug;

use crate::ledger::error::LedgerError;
use crate::ledger::types::VoucherKey;

/// What a lock protects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockKey {
    /// A voucher's status and every outstanding amount referencing it.
    Voucher(VoucherKey),
    /// Balance of an account with a required sign.
    Account(AccountId),
    /// Postings of a party in a company.
    Party(String, String),
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Voucher(key) => write!(f, "voucher {key}"),
            Self::Account(id) => write!(f, "account {id}"),
            Self::Party(company, party) => write!(f, "party {party} in {company}"),
        }
    }
}

/// Locks held until dropped. Releasing a key no one else waits on removes
/// its slot from the table.
#[must_use]
pub struct HeldLocks<'a> {
    table: &'a LockTable,
    keys: BTreeSet<LockKey>,
    guards: Vec<ArcMutexGuard<RawMutex, ()>>,
}

impl HeldLocks<'_> {
    /// Returns true if every key in `keys` is held.
    pub fn covers(&self, keys: &BTreeSet<LockKey>) -> bool {
        keys.is_subset(&self.keys)
    }
}

impl Drop for HeldLocks<'_> {
    fn drop(&mut self) {
        self.guards.clear();
        for key in &self.keys {
            self.table.prune(key);
        }
    }
}

/// One mutex per key, created on first use and removed once released.
#[derive(Debug, Default)]
pub struct LockTable {
    slots: DashMap<LockKey, Arc<Mutex<()>>>,
}

impl LockTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires every key in sorted order, waiting at most `timeout` per key.
    ///
    /// # Errors
    ///
    /// `LockContention` if a key stays held past the timeout; nothing is held
    /// on return.
    pub fn acquire(&self, keys: BTreeSet<LockKey>, timeout: Duration) -> Result<HeldLocks<'_>, LedgerError> {
        let mut held = HeldLocks {
            table: self,
            keys: BTreeSet::new(),
            guards: Vec::with_capacity(keys.len()),
        };
        for key in keys {
            let slot = Arc::clone(self.slots.entry(key.clone()).or_default().value());
            let guard = slot.try_lock_arc_for(timeout);
            drop(slot);
            match guard {
                Some(guard) => {
                    held.guards.push(guard);
                    held.keys.insert(key);
                }
                None => {
                    debug!(%key, "Lock contended");
                    self.prune(&key);
                    return Err(LedgerError::LockContention { attempts: 1 });
                }
            }
        }
        Ok(held)
    }

    /// Drops the slot of `key` unless another caller holds or waits on it.
    ///
    /// Slots are only cloned under the map's shard lock, which `remove_if`
    /// also holds, so a count of one means no one else can reach the mutex.
    fn prune(&self, key: &LockKey) {
        self.slots.remove_if(key, |_, slot| Arc::strong_count(slot) == 1);
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
