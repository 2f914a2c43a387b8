//! Linking payments to documents, advances and payment drafts.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tally_shared::types::AccountId;
use tracing::info;

use super::plan::CommitPlan;
use super::{EngineContext, GeneralLedger};
use crate::ledger::entry::LedgerEntry;
use crate::ledger::error::LedgerError;
use crate::ledger::reversal::ReversalService;
use crate::ledger::types::{DocStatus, VoucherKey, VoucherType};
use crate::reconciliation::{
    AdvanceLine, Allocation, AllocationPlanner, Side, allocate_fifo, collect_advances,
};
use crate::voucher::{JournalKind, JournalLine, JournalVoucher, Postable, Voucher, VoucherHeader};

impl GeneralLedger {
    /// Links unlinked journal lines to the documents they settle.
    ///
    /// Every allocation is planned and checked before anything is written;
    /// each source voucher is reversed and re-posted with the allocated lines
    /// tagged, and the unallocated part of a line split off unlinked. The
    /// re-post is an adjustment and skips period and balance-sign checks.
    pub fn reconcile_against_document(&self, allocations: &[Allocation]) -> Result<Vec<LedgerEntry>, LedgerError> {
        if allocations.is_empty() {
            return Ok(Vec::new());
        }
        let committed = self.run("reconcile", |ctx| {
            for allocation in allocations {
                self.check_target(allocation)?;
            }
            let mut plan = CommitPlan::new(false, true);
            self.plan_allocations(ctx, allocations, &mut plan)?;
            Ok(plan)
        })?;

        let allocated: Decimal = allocations.iter().map(|a| a.allocated_amount).sum();
        info!(allocations = allocations.len(), %allocated, "Payments reconciled");
        Ok(committed)
    }

    /// Unlinked lines of submitted journal vouchers for a party, oldest first.
    #[must_use]
    pub fn advances_for(&self, party: &str, account: AccountId, side: Side) -> Vec<AdvanceLine> {
        let journals: Vec<JournalVoucher> = self
            .documents
            .iter()
            .filter(|record| record.status == DocStatus::Submitted)
            .filter_map(|record| record.voucher.as_journal().cloned())
            .collect();
        collect_advances(&journals, party, account, side)
    }

    /// Settles up to `amount` of an invoice's outstanding from the party's
    /// advances, oldest first. With `None`, settles as much as possible.
    pub fn allocate_advances(&self, target: &VoucherKey, amount: Option<Decimal>) -> Result<Vec<LedgerEntry>, LedgerError> {
        let record = self.submitted_document(target)?;
        let (Some(party), Some(account)) = (record.voucher.party(), record.voucher.party_account()) else {
            return Err(LedgerError::invalid(target, "Advances can only be allocated to invoices"));
        };
        let outstanding = self.get_outstanding(target.voucher_type, &target.voucher_no, Some(party));
        let wanted = amount.map_or(outstanding, |a| a.min(outstanding));
        if wanted <= Decimal::ZERO {
            return Ok(Vec::new());
        }

        let advances = self.advances_for(party, account, Side::settling(target.voucher_type));
        let allocations = allocate_fifo(&advances, target, wanted);
        self.reconcile_against_document(&allocations)
    }

    /// Builds a Draft bank voucher settling the current outstanding of an
    /// invoice through `bank_account`.
    pub fn make_payment_entry(
        &self,
        target: &VoucherKey,
        bank_account: AccountId,
        header: VoucherHeader,
        reference_no: &str,
    ) -> Result<JournalVoucher, LedgerError> {
        let record = self.submitted_document(target)?;
        let (Some(party), Some(account)) = (record.voucher.party(), record.voucher.party_account()) else {
            return Err(LedgerError::invalid(target, "Payments can only be made against invoices"));
        };
        let outstanding = self.get_outstanding(target.voucher_type, &target.voucher_no, Some(party));
        if outstanding <= Decimal::ZERO {
            return Err(LedgerError::invalid(target, "Nothing is outstanding"));
        }

        let party_line = match Side::settling(target.voucher_type) {
            Side::Credit => JournalLine::credit(account, outstanding),
            Side::Debit => JournalLine::debit(account, outstanding),
        }
        .party(party)
        .against(target.clone());
        let bank_line = match Side::settling(target.voucher_type) {
            Side::Credit => JournalLine::debit(bank_account, outstanding),
            Side::Debit => JournalLine::credit(bank_account, outstanding),
        };
        let date = header.posting_date;

        Ok(JournalVoucher::new(header, vec![party_line, bank_line])
            .kind(JournalKind::BankEntry)
            .cheque(reference_no, date)
            .user_remark(format!("Payment against {target}")))
    }

    // ========================================================================
    // Planning
    // ========================================================================

    /// Applies allocations to their source vouchers and adds the re-posts.
    pub(super) fn plan_allocations(
        &self,
        ctx: &EngineContext<'_>,
        allocations: &[Allocation],
        plan: &mut CommitPlan,
    ) -> Result<(), LedgerError> {
        let mut by_source: BTreeMap<&VoucherKey, Vec<&Allocation>> = BTreeMap::new();
        for allocation in allocations {
            by_source.entry(&allocation.source).or_default().push(allocation);
        }
        for (source, group) in by_source {
            let jv = self.submitted_journal(source)?;
            let planned = AllocationPlanner::apply(&jv, &group)?;
            self.plan_repost(ctx, planned, plan)?;
        }
        Ok(())
    }

    /// Advances listed on an invoice being submitted.
    pub(super) fn plan_advances(
        &self,
        ctx: &EngineContext<'_>,
        voucher: &Voucher,
        plan: &mut CommitPlan,
    ) -> Result<(), LedgerError> {
        let (Some(party), Some(account)) = (voucher.party(), voucher.party_account()) else {
            return Ok(());
        };
        let target = voucher.key();
        let side = Side::settling(target.voucher_type);
        let allocations: Vec<Allocation> = voucher
            .advances()
            .iter()
            .map(|advance| Allocation {
                source: VoucherKey::new(VoucherType::JournalVoucher, advance.journal_voucher.clone()),
                line: advance.line,
                target: target.clone(),
                account,
                party: Some(party.to_string()),
                side,
                unadjusted_amount: advance.advance_amount,
                allocated_amount: advance.allocated_amount,
            })
            .collect();
        self.plan_allocations(ctx, &allocations, plan)
    }

    /// Reverses a journal voucher's live rows and posts `jv` in their place.
    pub(super) fn plan_repost(
        &self,
        ctx: &EngineContext<'_>,
        jv: JournalVoucher,
        plan: &mut CommitPlan,
    ) -> Result<(), LedgerError> {
        let key = jv.key();
        let voucher = Voucher::from(jv);
        let (rows, _) = self.build_rows(ctx, &voucher, false)?;
        plan.push_rows(ReversalService::mirror_all(&self.store.active_entries(&key)));
        plan.push_rows(rows);
        plan.store_document(voucher, DocStatus::Submitted);
        Ok(())
    }

    pub(super) fn submitted_journal(&self, key: &VoucherKey) -> Result<JournalVoucher, LedgerError> {
        let record = self.submitted_document(key)?;
        record
            .voucher
            .as_journal()
            .cloned()
            .ok_or_else(|| LedgerError::invalid(key, "Not a journal voucher"))
    }

    fn submitted_document(&self, key: &VoucherKey) -> Result<super::DocumentRecord, LedgerError> {
        let record = self
            .document(key)
            .ok_or_else(|| LedgerError::VoucherNotFound(key.clone()))?;
        if record.status != DocStatus::Submitted {
            return Err(LedgerError::TargetNotSubmitted(key.clone()));
        }
        Ok(record)
    }

    fn check_target(&self, allocation: &Allocation) -> Result<(), LedgerError> {
        let target = self.submitted_document(&allocation.target)?;
        if let Some(party) = target.voucher.party() {
            if allocation.party.as_deref() != Some(party) {
                return Err(LedgerError::invalid(
                    &allocation.source,
                    format!("Party does not match {}", allocation.target),
                ));
            }
        }
        if let Some(account) = target.voucher.party_account() {
            if allocation.account != account {
                return Err(LedgerError::invalid(
                    &allocation.source,
                    format!("Account does not match {}", allocation.target),
                ));
            }
        }
        Ok(())
    }
}
