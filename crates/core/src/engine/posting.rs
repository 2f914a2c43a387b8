//! Submit, cancel and amend.

use std::collections::BTreeSet;

use tally_shared::types::{DebitCredit, RoleSet};
use tracing::{debug, info};

use super::locks::LockKey;
use super::plan::CommitPlan;
use super::{DocumentRecord, EngineContext, GeneralLedger, PostedEntrySet};
use crate::ledger::entry::LedgerEntry;
use crate::ledger::error::LedgerError;
use crate::ledger::reversal::ReversalService;
use crate::ledger::service::LedgerService;
use crate::ledger::types::{DocStatus, VoucherKey, VoucherType};
use crate::period::PeriodGuard;
use crate::voucher::{CancelAction, PostingContext, PurchaseInvoice, Voucher, VoucherWorkflow};

impl GeneralLedger {
    /// Runs the checks a submit runs before taking keyed locks, without
    /// writing anything.
    pub fn validate(&self, voucher: &Voucher) -> Result<(), LedgerError> {
        let tree = self.read_tree()?;
        let ctx = EngineContext { engine: self, tree: &tree };
        self.build_rows(&ctx, voucher, true).map(|_| ())
    }

    /// Validates and posts a Draft voucher.
    ///
    /// Advance allocations listed on an invoice are reconciled in the same
    /// commit. Nothing is written if any check fails.
    pub fn submit(&self, voucher: Voucher, roles: &RoleSet) -> Result<PostedEntrySet, LedgerError> {
        let key = voucher.key();
        let committed = self.run("submit", |ctx| self.plan_submit(ctx, &voucher, roles))?;

        let entries: Vec<LedgerEntry> = committed.into_iter().filter(|e| e.voucher == key).collect();
        let totals = LedgerService::calculate_totals(&entries);
        info!(voucher = %key, entries = entries.len(), total = %totals.debit, "Voucher submitted");
        Ok(PostedEntrySet {
            voucher: key,
            entries,
            totals,
        })
    }

    /// Reverses a submitted voucher.
    ///
    /// Journal lines of other vouchers linked to this one are re-posted
    /// unlinked, so they become on-account again. Cancelling a cancelled
    /// voucher does nothing.
    pub fn cancel(&self, key: &VoucherKey, roles: &RoleSet) -> Result<(), LedgerError> {
        let record = self
            .document(key)
            .ok_or_else(|| LedgerError::VoucherNotFound(key.clone()))?;
        if VoucherWorkflow::cancel(key, record.status)? == CancelAction::AlreadyCancelled {
            debug!(voucher = %key, "Already cancelled");
            return Ok(());
        }

        let committed = self.run("cancel", |ctx| self.plan_cancel(ctx, key, roles))?;
        let reversed = committed.iter().filter(|e| &e.voucher == key).count();
        info!(voucher = %key, reversed, "Voucher cancelled");
        Ok(())
    }

    /// Creates the Draft amendment of a cancelled voucher.
    pub fn amend(&self, voucher_type: VoucherType, voucher_no: &str) -> Result<Voucher, LedgerError> {
        let key = VoucherKey::new(voucher_type, voucher_no);
        let _held = self.with_retry("amend", || {
            self.locks.acquire(
                BTreeSet::from([LockKey::Voucher(key.clone())]),
                self.config.lock_timeout(),
            )
        })?;

        let record = self
            .document(&key)
            .ok_or_else(|| LedgerError::VoucherNotFound(key.clone()))?;
        if let Some(existing) = record.amended_by.as_deref() {
            self.ensure_no_live_amendment(&key, existing)?;
        }

        let amended = VoucherWorkflow::amend(&record.voucher, record.status)?;
        let amended_key = amended.key();
        if self.documents.contains_key(&amended_key) {
            return Err(LedgerError::AmendmentConflict {
                voucher: key,
                amendment: amended_key.voucher_no,
            });
        }
        self.documents.insert(
            amended_key.clone(),
            DocumentRecord {
                voucher: amended.clone(),
                status: DocStatus::Draft,
                amended_by: None,
                outstanding: None,
            },
        );
        if let Some(mut original) = self.documents.get_mut(&key) {
            original.amended_by = Some(amended_key.voucher_no.clone());
        }
        info!(voucher = %key, amendment = %amended_key.voucher_no, "Voucher amended");
        Ok(amended)
    }

    // ========================================================================
    // Planning
    // ========================================================================

    /// Runs variant checks (when `validate` is set) and turns the voucher's
    /// candidate rows into a validated, balanced set.
    pub(super) fn build_rows(
        &self,
        ctx: &EngineContext<'_>,
        voucher: &Voucher,
        validate: bool,
    ) -> Result<(Vec<LedgerEntry>, DebitCredit), LedgerError> {
        let postable = voucher.postable();
        if validate {
            postable.validate(ctx)?;
        }
        let drafts = postable.gl_entries(ctx)?;
        let header = postable.entry_header();
        let masters = ctx.masters();
        LedgerService::build_entries(&header, drafts, |id| ctx.account(id), &masters)
    }

    fn plan_submit(
        &self,
        ctx: &EngineContext<'_>,
        voucher: &Voucher,
        roles: &RoleSet,
    ) -> Result<CommitPlan, LedgerError> {
        let key = voucher.key();
        let current = self
            .documents
            .get(&key)
            .map_or(voucher.header().docstatus, |record| record.status);
        VoucherWorkflow::submit(&key, current)?;
        let amendment = self.check_amendment(voucher)?;

        let (rows, _) = self.build_rows(ctx, voucher, true)?;

        let guard = PeriodGuard::new(&self.period);
        guard.check_freezing_date(voucher.header().posting_date, roles, false)?;
        for row in &rows {
            guard.validate_frozen_account(&ctx.account(row.account)?, roles, false)?;
        }
        let credit_controller = guard.is_credit_controller(roles);
        if let Voucher::Journal(jv) = voucher {
            jv.check_credit_days(&ctx.masters(), credit_controller)?;
        }

        let mut plan = CommitPlan::new(false, false);
        plan.push_rows(rows);
        self.plan_advances(ctx, voucher, &mut plan)?;
        let limited = matches!(voucher, Voucher::Journal(_) | Voucher::SalesInvoice(_));
        if limited && !credit_controller {
            let masters = ctx.masters();
            plan.limit_credit(|party, company| masters.credit_limit(party, company));
        }
        if let Voucher::PurchaseInvoice(pi @ PurchaseInvoice { bill_no: Some(_), .. }) = voucher {
            plan.parties.insert((pi.header.company.clone(), pi.supplier.clone()));
        }

        let mut posted = voucher.clone();
        posted.header_mut().docstatus = DocStatus::Submitted;
        plan.store_document(posted, DocStatus::Submitted);
        plan.amendment_of = amendment.map(|original| (original, key.voucher_no));
        Ok(plan)
    }

    fn plan_cancel(
        &self,
        ctx: &EngineContext<'_>,
        key: &VoucherKey,
        roles: &RoleSet,
    ) -> Result<CommitPlan, LedgerError> {
        let mut plan = CommitPlan::new(true, false);
        let record = self
            .document(key)
            .ok_or_else(|| LedgerError::VoucherNotFound(key.clone()))?;
        if VoucherWorkflow::cancel(key, record.status)? == CancelAction::AlreadyCancelled {
            return Ok(plan);
        }

        let guard = PeriodGuard::new(&self.period);
        guard.check_freezing_date(record.voucher.header().posting_date, roles, false)?;
        let own = self.store.active_entries(key);
        for row in &own {
            guard.validate_frozen_account(&ctx.account(row.account)?, roles, false)?;
        }

        let linked: BTreeSet<VoucherKey> = self
            .store
            .active_entries_against(key)
            .into_iter()
            .map(|row| row.voucher)
            .filter(|voucher| voucher.voucher_type == VoucherType::JournalVoucher)
            .collect();
        for source in linked {
            let mut jv = self.submitted_journal(&source)?;
            for line in &mut jv.lines {
                if line.against.as_ref() == Some(key) {
                    line.against = None;
                }
            }
            debug!(voucher = %key, linked = %source, "Unlinking journal voucher");
            self.plan_repost(ctx, jv, &mut plan)?;
        }

        plan.push_rows(ReversalService::mirror_all(&own));
        let mut cancelled = record.voucher;
        cancelled.header_mut().docstatus = DocStatus::Cancelled;
        plan.store_document(cancelled, DocStatus::Cancelled);
        Ok(plan)
    }

    /// For an amendment, checks that the original is cancelled and has no
    /// other live amendment. Returns the original's key.
    fn check_amendment(&self, voucher: &Voucher) -> Result<Option<VoucherKey>, LedgerError> {
        let Some(original_no) = voucher.header().amended_from.as_deref() else {
            return Ok(None);
        };
        let original = VoucherKey::new(voucher.voucher_type(), original_no);
        let record = self
            .document(&original)
            .ok_or_else(|| LedgerError::VoucherNotFound(original.clone()))?;
        if record.status != DocStatus::Cancelled {
            return Err(LedgerError::InvalidTransition {
                voucher: original,
                from: record.status,
                action: "amend",
            });
        }
        if let Some(existing) = record.amended_by.as_deref() {
            if existing != voucher.header().voucher_no {
                self.ensure_no_live_amendment(&original, existing)?;
            }
        }
        Ok(Some(original))
    }

    fn ensure_no_live_amendment(&self, original: &VoucherKey, amendment: &str) -> Result<(), LedgerError> {
        let key = VoucherKey::new(original.voucher_type, amendment);
        let live = self
            .documents
            .get(&key)
            .is_some_and(|record| record.status != DocStatus::Cancelled);
        if live {
            return Err(LedgerError::AmendmentConflict {
                voucher: original.clone(),
                amendment: amendment.to_string(),
            });
        }
        Ok(())
    }
}
