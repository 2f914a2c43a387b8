//! Chart of accounts administration and master data.
//!
//! Structural edits hold the tree write lock, so no posting runs while the
//! nested-set ranges are renumbered.

use tally_shared::types::{AccountId, RoleSet};
use tracing::info;

use super::GeneralLedger;
use crate::accounts::{Account, NewAccount, RenameOutcome};
use crate::ledger::error::LedgerError;
use crate::masters::{CreditTerms, FiscalYear, Party};

impl GeneralLedger {
    /// Adds an account.
    pub fn insert_account(&self, account: NewAccount) -> Result<AccountId, LedgerError> {
        let mut tree = self.with_retry("insert_account", || self.write_tree())?;
        let id = tree.insert(account)?;
        info!(account = %id, "Account created");
        Ok(id)
    }

    /// Moves an account under a new parent.
    pub fn move_account(&self, id: AccountId, new_parent: AccountId) -> Result<(), LedgerError> {
        let mut tree = self.with_retry("move_account", || self.write_tree())?;
        tree.move_to(id, new_parent)?;
        info!(account = %id, parent = %new_parent, "Account moved");
        Ok(())
    }

    /// Deletes an account with no children and no ledger rows.
    pub fn delete_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        let mut tree = self.with_retry("delete_account", || self.write_tree())?;
        let removed = tree.delete(id, |account| self.store.has_entries(account))?;
        info!(account = %removed.name, "Account deleted");
        Ok(removed)
    }

    /// Turns a ledger account into a group.
    pub fn convert_to_group(&self, id: AccountId) -> Result<(), LedgerError> {
        let mut tree = self.with_retry("convert_to_group", || self.write_tree())?;
        tree.convert_to_group(id, |account| self.store.has_entries(account))?;
        Ok(())
    }

    /// Turns a group account into a ledger.
    pub fn convert_to_ledger(&self, id: AccountId) -> Result<(), LedgerError> {
        let mut tree = self.with_retry("convert_to_ledger", || self.write_tree())?;
        tree.convert_to_ledger(id, |account| self.store.has_entries(account))?;
        Ok(())
    }

    /// Renames an account, or merges it into the account already carrying
    /// `new_name`. A merge moves its ledger rows and document references to
    /// the surviving account.
    pub fn rename_account(&self, id: AccountId, new_name: &str, merge: bool) -> Result<RenameOutcome, LedgerError> {
        let mut tree = self.with_retry("rename_account", || self.write_tree())?;
        let outcome = tree.rename(id, new_name, merge)?;
        if let RenameOutcome::Merged { from, into } = outcome {
            let moved = self.store.reassign_account(from, into);
            for mut record in self.documents.iter_mut() {
                record.voucher.reassign_account(from, into);
            }
            info!(%from, %into, rows = moved, "Accounts merged");
        }
        Ok(outcome)
    }

    /// Freezes or unfreezes an account. Requires the modifier role.
    pub fn set_frozen(&self, id: AccountId, frozen: bool, roles: &RoleSet) -> Result<(), LedgerError> {
        let mut tree = self.with_retry("set_frozen", || self.write_tree())?;
        tree.set_frozen(id, frozen, roles, &self.period)?;
        info!(account = %id, frozen, "Account freeze changed");
        Ok(())
    }

    /// Disables an account; later postings to it fail.
    pub fn disable_account(&self, id: AccountId) -> Result<(), LedgerError> {
        let mut tree = self.with_retry("disable_account", || self.write_tree())?;
        tree.disable(id)?;
        info!(account = %id, "Account disabled");
        Ok(())
    }

    /// Registers a fiscal year.
    pub fn add_fiscal_year(&self, year: FiscalYear) -> Result<(), LedgerError> {
        self.masters.write().add_fiscal_year(year)
    }

    /// Registers a cost center of a company.
    pub fn add_cost_center(&self, name: impl Into<String>, company: impl Into<String>) {
        self.masters.write().add_cost_center(name, company);
    }

    /// Registers or replaces a customer or supplier.
    pub fn register_party(&self, party: Party) {
        self.masters.write().register_party(party);
    }

    /// Sets a company's credit days and credit limit defaults.
    pub fn set_credit_terms(&self, company: impl Into<String>, terms: CreditTerms) {
        self.masters.write().set_credit_terms(company, terms);
    }
}
