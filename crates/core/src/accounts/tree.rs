//! Arena-backed chart of accounts with a nested-set index.
//!
//! Accounts live in a map keyed by their stable [`AccountId`]. Every
//! structural change ends with [`AccountTree::rebuild`], which walks the tree
//! depth first (roots and siblings ordered by name) and reassigns `lft`/`rgt`.
//! Callers hold the tree behind a lock, so a half-renumbered tree is never
//! visible.

use std::collections::HashMap;

use tally_shared::{PeriodConfig, types::AccountId, types::RoleSet};

use super::error::AccountError;
use super::types::{Account, NewAccount, NormalBalance, RenameOutcome};

/// The chart of accounts for any number of companies.
#[derive(Debug, Clone, Default)]
pub struct AccountTree {
    nodes: HashMap<AccountId, Account>,
    names: HashMap<(String, String), AccountId>,
}

impl AccountTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Returns the account with this id.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.nodes.get(&id)
    }

    /// Returns the account or a `NotFound` error.
    pub fn require(&self, id: AccountId) -> Result<&Account, AccountError> {
        self.nodes.get(&id).ok_or(AccountError::NotFound(id))
    }

    /// Looks an account up by its name within a company.
    #[must_use]
    pub fn find_by_name(&self, name: &str, company: &str) -> Option<&Account> {
        self.names
            .get(&(company.to_string(), name.to_string()))
            .and_then(|id| self.nodes.get(id))
    }

    /// Iterates over all accounts in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.nodes.values()
    }

    /// Direct children of a node, ordered by name.
    #[must_use]
    pub fn children(&self, id: AccountId) -> Vec<&Account> {
        let mut children: Vec<&Account> = self
            .nodes
            .values()
            .filter(|a| a.parent == Some(id))
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        children
    }

    /// Ancestors of a node, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: AccountId) -> Vec<&Account> {
        let mut out = Vec::new();
        let mut cursor = self.nodes.get(&id).and_then(|a| a.parent);
        while let Some(parent_id) = cursor {
            let Some(parent) = self.nodes.get(&parent_id) else {
                break;
            };
            out.push(parent);
            cursor = parent.parent;
        }
        out
    }

    /// All nodes strictly inside this node's nested-set range, in tree order.
    #[must_use]
    pub fn descendants(&self, id: AccountId) -> Vec<&Account> {
        let Some(root) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let mut out: Vec<&Account> = self
            .nodes
            .values()
            .filter(|a| a.company == root.company && root.contains(a))
            .collect();
        out.sort_by_key(|a| a.lft);
        out
    }

    /// Leaf accounts of a company, in tree order.
    #[must_use]
    pub fn ledgers(&self, company: &str) -> Vec<&Account> {
        let mut out: Vec<&Account> = self
            .nodes
            .values()
            .filter(|a| a.company == company && !a.is_group)
            .collect();
        out.sort_by_key(|a| a.lft);
        out
    }

    // ========================================================================
    // Structural operations
    // ========================================================================

    /// Adds an account and renumbers the tree.
    ///
    /// # Errors
    ///
    /// Fails if the name is blank or taken, the parent is missing, is a ledger
    /// or belongs to another company, or a root omits its report type.
    pub fn insert(&mut self, input: NewAccount) -> Result<AccountId, AccountError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AccountError::EmptyName);
        }

        let (report_type, normal_balance) = match input.parent {
            Some(parent_id) => {
                let parent = self
                    .nodes
                    .get(&parent_id)
                    .ok_or(AccountError::ParentNotFound(parent_id))?;
                if !parent.is_group {
                    return Err(AccountError::ParentIsLedger(parent.name.clone()));
                }
                if parent.company != input.company {
                    return Err(AccountError::CompanyMismatch {
                        account: name,
                        company: input.company,
                        parent_company: parent.company.clone(),
                    });
                }
                (parent.report_type, parent.normal_balance)
            }
            None => (
                input
                    .report_type
                    .ok_or_else(|| AccountError::ReportTypeMissing(name.clone()))?,
                input.normal_balance.unwrap_or(NormalBalance::Debit),
            ),
        };

        let key = (input.company.clone(), name.clone());
        if self.names.contains_key(&key) {
            return Err(AccountError::DuplicateName {
                name,
                company: input.company,
            });
        }

        let id = AccountId::new();
        self.nodes.insert(
            id,
            Account {
                id,
                name,
                parent: input.parent,
                company: input.company,
                is_group: input.is_group,
                report_type,
                account_type: input.account_type,
                normal_balance,
                frozen: input.frozen,
                disabled: false,
                balance_must_be: input.balance_must_be,
                lft: 0,
                rgt: 0,
            },
        );
        self.names.insert(key, id);
        self.rebuild();
        Ok(id)
    }

    /// Moves a node (and its subtree) under a new parent.
    ///
    /// The subtree takes over the new parent's report type and normal balance.
    ///
    /// # Errors
    ///
    /// Rejects roots, self-parenting, ledger parents, other companies and any
    /// parent inside the node's own subtree.
    pub fn move_to(&mut self, id: AccountId, new_parent: AccountId) -> Result<(), AccountError> {
        let node = self.require(id)?;
        if node.is_root() {
            return Err(AccountError::RootImmutable(node.name.clone()));
        }
        if id == new_parent {
            return Err(AccountError::SelfParent(node.name.clone()));
        }
        let parent = self
            .nodes
            .get(&new_parent)
            .ok_or(AccountError::ParentNotFound(new_parent))?;
        if !parent.is_group {
            return Err(AccountError::ParentIsLedger(parent.name.clone()));
        }
        if parent.company != node.company {
            return Err(AccountError::CompanyMismatch {
                account: node.name.clone(),
                company: node.company.clone(),
                parent_company: parent.company.clone(),
            });
        }
        if node.contains(parent) {
            return Err(AccountError::CyclicParent {
                account: node.name.clone(),
                parent: parent.name.clone(),
            });
        }

        let inherited = (parent.report_type, parent.normal_balance);
        let mut subtree: Vec<AccountId> = self.descendants(id).iter().map(|a| a.id).collect();
        subtree.push(id);
        for member in subtree {
            if let Some(account) = self.nodes.get_mut(&member) {
                (account.report_type, account.normal_balance) = inherited;
            }
        }
        if let Some(account) = self.nodes.get_mut(&id) {
            account.parent = Some(new_parent);
        }
        self.rebuild();
        Ok(())
    }

    /// Removes a childless, unused, non-root account.
    ///
    /// # Errors
    ///
    /// `RootImmutable`, `ChildExists` or `TransactionsExist`.
    pub fn delete(
        &mut self,
        id: AccountId,
        has_entries: impl Fn(AccountId) -> bool,
    ) -> Result<Account, AccountError> {
        let node = self.require(id)?;
        if node.is_root() {
            return Err(AccountError::RootImmutable(node.name.clone()));
        }
        if self.has_children(id) {
            return Err(AccountError::ChildExists(node.name.clone()));
        }
        if has_entries(id) {
            return Err(AccountError::TransactionsExist(node.name.clone()));
        }

        let removed = self.remove_node(id)?;
        self.rebuild();
        Ok(removed)
    }

    /// Turns a ledger into a group.
    ///
    /// # Errors
    ///
    /// Fails if the account is a root, has entries, or has an account type.
    pub fn convert_to_group(
        &mut self,
        id: AccountId,
        has_entries: impl Fn(AccountId) -> bool,
    ) -> Result<(), AccountError> {
        let node = self.require(id)?;
        if node.is_group {
            return Ok(());
        }
        if node.is_root() {
            return Err(AccountError::RootImmutable(node.name.clone()));
        }
        if has_entries(id) {
            return Err(AccountError::TransactionsExist(node.name.clone()));
        }
        if node.account_type.is_some() {
            return Err(AccountError::AccountTypeSet(node.name.clone()));
        }
        self.set_group_flag(id, true);
        Ok(())
    }

    /// Turns a group into a ledger.
    ///
    /// # Errors
    ///
    /// Fails if the account has children, is a root, or has entries.
    pub fn convert_to_ledger(
        &mut self,
        id: AccountId,
        has_entries: impl Fn(AccountId) -> bool,
    ) -> Result<(), AccountError> {
        let node = self.require(id)?;
        if !node.is_group {
            return Ok(());
        }
        if self.has_children(id) {
            return Err(AccountError::ChildExists(node.name.clone()));
        }
        if node.is_root() {
            return Err(AccountError::RootImmutable(node.name.clone()));
        }
        if has_entries(id) {
            return Err(AccountError::TransactionsExist(node.name.clone()));
        }
        self.set_group_flag(id, false);
        Ok(())
    }

    /// Renames an account, or folds it into an existing one when `merge` is set.
    ///
    /// A merge moves the children of `id` under the surviving account and
    /// removes `id`; the caller is responsible for moving ledger entries.
    ///
    /// # Errors
    ///
    /// Rejects roots, blank names, taken names without `merge`, unknown merge
    /// targets and targets that differ in group flag, report type or company.
    pub fn rename(
        &mut self,
        id: AccountId,
        new_name: &str,
        merge: bool,
    ) -> Result<RenameOutcome, AccountError> {
        let node = self.require(id)?;
        if node.is_root() {
            return Err(AccountError::RootImmutable(node.name.clone()));
        }
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AccountError::EmptyName);
        }

        let existing = self.find_by_name(new_name, &node.company);
        match (existing, merge) {
            (Some(target), _) if target.id == id => Ok(RenameOutcome::Renamed(id)),
            (Some(target), true) => {
                if target.is_group != node.is_group
                    || target.report_type != node.report_type
                    || target.company != node.company
                {
                    return Err(AccountError::MergeMismatch {
                        from: node.name.clone(),
                        into: target.name.clone(),
                    });
                }
                if node.contains(target) {
                    return Err(AccountError::CyclicParent {
                        account: node.name.clone(),
                        parent: target.name.clone(),
                    });
                }
                let into = target.id;
                self.merge_into(id, into)?;
                Ok(RenameOutcome::Merged { from: id, into })
            }
            (Some(target), false) => Err(AccountError::DuplicateName {
                name: target.name.clone(),
                company: target.company.clone(),
            }),
            (None, true) => Err(AccountError::MergeTargetNotFound {
                name: new_name.to_string(),
                company: node.company.clone(),
            }),
            (None, false) => {
                let company = node.company.clone();
                let old_name = node.name.clone();
                self.names.remove(&(company.clone(), old_name));
                self.names.insert((company, new_name.to_string()), id);
                if let Some(account) = self.nodes.get_mut(&id) {
                    account.name = new_name.to_string();
                }
                self.rebuild();
                Ok(RenameOutcome::Renamed(id))
            }
        }
    }

    /// Freezes or unfreezes an account.
    ///
    /// # Errors
    ///
    /// `FreezeNotPermitted` unless a modifier role is configured and held.
    pub fn set_frozen(
        &mut self,
        id: AccountId,
        frozen: bool,
        roles: &RoleSet,
        period: &PeriodConfig,
    ) -> Result<(), AccountError> {
        let node = self.require(id)?;
        if node.frozen == frozen {
            return Ok(());
        }
        let allowed = period
            .frozen_accounts_modifier
            .as_deref()
            .is_some_and(|role| roles.contains(role));
        if !allowed {
            return Err(AccountError::FreezeNotPermitted(node.name.clone()));
        }
        if let Some(account) = self.nodes.get_mut(&id) {
            account.frozen = frozen;
        }
        Ok(())
    }

    /// Marks an account disabled. Postings against it fail afterwards.
    ///
    /// # Errors
    ///
    /// Roots cannot be disabled.
    pub fn disable(&mut self, id: AccountId) -> Result<(), AccountError> {
        let node = self.require(id)?;
        if node.is_root() {
            return Err(AccountError::RootImmutable(node.name.clone()));
        }
        if let Some(account) = self.nodes.get_mut(&id) {
            account.disabled = true;
        }
        Ok(())
    }

    // ========================================================================
    // Nested set
    // ========================================================================

    /// Recomputes every `lft`/`rgt` with one depth-first walk.
    ///
    /// Roots and siblings are visited in name order (company breaks ties
    /// between roots), so the numbering only depends on the tree's shape.
    pub fn rebuild(&mut self) {
        let mut by_parent: HashMap<Option<AccountId>, Vec<AccountId>> = HashMap::new();
        for account in self.nodes.values() {
            by_parent.entry(account.parent).or_default().push(account.id);
        }
        for siblings in by_parent.values_mut() {
            siblings.sort_by(|a, b| {
                let (a, b) = (&self.nodes[a], &self.nodes[b]);
                a.name.cmp(&b.name).then_with(|| a.company.cmp(&b.company))
            });
        }

        let mut bounds: HashMap<AccountId, (u32, u32)> = HashMap::with_capacity(self.nodes.len());
        let mut counter = 0u32;
        // (node, children visited)
        let mut stack: Vec<(AccountId, bool)> = by_parent
            .get(&None)
            .map(|roots| roots.iter().rev().map(|id| (*id, false)).collect())
            .unwrap_or_default();

        while let Some((id, expanded)) = stack.pop() {
            counter += 1;
            if expanded {
                if let Some(entry) = bounds.get_mut(&id) {
                    entry.1 = counter;
                }
                continue;
            }
            bounds.insert(id, (counter, 0));
            stack.push((id, true));
            if let Some(children) = by_parent.get(&Some(id)) {
                stack.extend(children.iter().rev().map(|child| (*child, false)));
            }
        }

        for (id, (lft, rgt)) in bounds {
            if let Some(account) = self.nodes.get_mut(&id) {
                account.lft = lft;
                account.rgt = rgt;
            }
        }
    }

    /// Verifies that every node lies strictly inside its parent's range.
    ///
    /// # Errors
    ///
    /// `ContainmentBroken` naming the first offending pair.
    pub fn check_containment(&self) -> Result<(), AccountError> {
        for node in self.nodes.values() {
            if node.lft >= node.rgt {
                return Err(AccountError::ContainmentBroken {
                    ancestor: node.name.clone(),
                    node: node.name.clone(),
                });
            }
            for ancestor in self.ancestors(node.id) {
                if !ancestor.contains(node) {
                    return Err(AccountError::ContainmentBroken {
                        ancestor: ancestor.name.clone(),
                        node: node.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn has_children(&self, id: AccountId) -> bool {
        self.nodes.values().any(|a| a.parent == Some(id))
    }

    fn set_group_flag(&mut self, id: AccountId, is_group: bool) {
        if let Some(account) = self.nodes.get_mut(&id) {
            account.is_group = is_group;
        }
    }

    fn remove_node(&mut self, id: AccountId) -> Result<Account, AccountError> {
        let removed = self.nodes.remove(&id).ok_or(AccountError::NotFound(id))?;
        self.names
            .remove(&(removed.company.clone(), removed.name.clone()));
        Ok(removed)
    }

    fn merge_into(&mut self, from: AccountId, into: AccountId) -> Result<(), AccountError> {
        for account in self.nodes.values_mut() {
            if account.parent == Some(from) {
                account.parent = Some(into);
            }
        }
        self.remove_node(from)?;
        self.rebuild();
        Ok(())
    }
}
