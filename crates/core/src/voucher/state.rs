//! Voucher lifecycle transitions.
//!
//! Draft → Submitted → Cancelled. A cancelled voucher can be amended into a
//! new Draft copy; the original stays Cancelled.

use crate::ledger::error::LedgerError;
use crate::ledger::types::{DocStatus, VoucherKey};

use super::Voucher;

/// Outcome of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelAction {
    /// Write the reversing set.
    Reverse,
    /// Already cancelled, nothing to do.
    AlreadyCancelled,
}

/// Stateless transition checks.
pub struct VoucherWorkflow;

impl VoucherWorkflow {
    /// Checks that a voucher in `current` status can be submitted.
    pub fn submit(voucher: &VoucherKey, current: DocStatus) -> Result<DocStatus, LedgerError> {
        match current {
            DocStatus::Draft => Ok(DocStatus::Submitted),
            _ => Err(LedgerError::InvalidTransition {
                voucher: voucher.clone(),
                from: current,
                action: "submit",
            }),
        }
    }

    /// Checks that a voucher in `current` status can be cancelled.
    ///
    /// Cancelling twice is a no-op.
    pub fn cancel(voucher: &VoucherKey, current: DocStatus) -> Result<CancelAction, LedgerError> {
        match current {
            DocStatus::Submitted => Ok(CancelAction::Reverse),
            DocStatus::Cancelled => Ok(CancelAction::AlreadyCancelled),
            DocStatus::Draft => Err(LedgerError::InvalidTransition {
                voucher: voucher.clone(),
                from: current,
                action: "cancel",
            }),
        }
    }

    /// Builds the Draft amendment of a cancelled voucher.
    ///
    /// When the original itself amends an earlier voucher, its numeric suffix
    /// is bumped instead of appending a new one.
    pub fn amend(original: &Voucher, current: DocStatus) -> Result<Voucher, LedgerError> {
        if current != DocStatus::Cancelled {
            return Err(LedgerError::InvalidTransition {
                voucher: original.key(),
                from: current,
                action: "amend",
            });
        }
        let original_no = original.header().voucher_no.clone();
        let original_is_amendment = original.header().amended_from.is_some();
        let mut amended = original.clone();
        let header = amended.header_mut();
        header.voucher_no = Self::amended_name(&original_no, original_is_amendment)
            .ok_or_else(|| LedgerError::invalid(&original.key(), "Amendment number is out of range"))?;
        header.amended_from = Some(original_no);
        header.docstatus = DocStatus::Draft;
        Ok(amended)
    }

    /// Name of the amendment: `INV-001` → `INV-001-1`, `INV-001-1` → `INV-001-2`.
    ///
    /// Returns `None` when the suffix cannot be bumped any further.
    pub fn amended_name(original_no: &str, original_is_amendment: bool) -> Option<String> {
        if original_is_amendment {
            if let Some((prefix, suffix)) = original_no.rsplit_once('-') {
                if let Ok(n) = suffix.parse::<u32>() {
                    return n.checked_add(1).map(|next| format!("{prefix}-{next}"));
                }
            }
        }
        Some(format!("{original_no}-1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::VoucherType;
    use crate::voucher::testing::header;
    use crate::voucher::{JournalLine, JournalVoucher};
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use tally_shared::types::AccountId;

    fn key() -> VoucherKey {
        VoucherKey::new(VoucherType::JournalVoucher, "JV-001")
    }

    fn journal() -> Voucher {
        let (cash, sales) = (AccountId::new(), AccountId::new());
        JournalVoucher::new(
            header("JV-001"),
            vec![
                JournalLine::debit(cash, dec!(500)),
                JournalLine::credit(sales, dec!(500)),
            ],
        )
        .into()
    }

    #[test]
    fn test_submit_only_from_draft() {
        assert_eq!(
            VoucherWorkflow::submit(&key(), DocStatus::Draft).unwrap(),
            DocStatus::Submitted
        );
        assert!(matches!(
            VoucherWorkflow::submit(&key(), DocStatus::Submitted),
            Err(LedgerError::InvalidTransition { action: "submit", .. })
        ));
        assert!(VoucherWorkflow::submit(&key(), DocStatus::Cancelled).is_err());
    }

    #[rstest]
    #[case(DocStatus::Submitted, Some(CancelAction::Reverse))]
    #[case(DocStatus::Cancelled, Some(CancelAction::AlreadyCancelled))]
    #[case(DocStatus::Draft, None)]
    fn test_cancel_transitions(#[case] from: DocStatus, #[case] expected: Option<CancelAction>) {
        assert_eq!(VoucherWorkflow::cancel(&key(), from).ok(), expected);
    }

    #[rstest]
    #[case("INV-001", false, "INV-001-1")]
    #[case("INV-001-1", true, "INV-001-2")]
    #[case("INV-001-9", true, "INV-001-10")]
    #[case("INV-2024", false, "INV-2024-1")]
    #[case("ADJ", true, "ADJ-1")]
    fn test_amended_name(#[case] original: &str, #[case] is_amendment: bool, #[case] expected: &str) {
        assert_eq!(
            VoucherWorkflow::amended_name(original, is_amendment).as_deref(),
            Some(expected)
        );
    }

    #[test]
    fn test_amendment_suffix_overflow_is_rejected() {
        let last = format!("JV-001-{}", u32::MAX);
        assert_eq!(VoucherWorkflow::amended_name(&last, true), None);

        let mut original = journal();
        original.header_mut().voucher_no = last;
        original.header_mut().amended_from = Some("JV-001".into());
        assert!(matches!(
            VoucherWorkflow::amend(&original, DocStatus::Cancelled),
            Err(LedgerError::InvalidVoucher { .. })
        ));
    }

    #[test]
    fn test_amend_creates_draft_copy() {
        let original = journal();
        let amended = VoucherWorkflow::amend(&original, DocStatus::Cancelled).unwrap();
        assert_eq!(amended.header().voucher_no, "JV-001-1");
        assert_eq!(amended.header().amended_from.as_deref(), Some("JV-001"));
        assert_eq!(amended.header().docstatus, DocStatus::Draft);
        assert_eq!(amended.as_journal().unwrap().lines, original.as_journal().unwrap().lines);

        let again = VoucherWorkflow::amend(&amended, DocStatus::Cancelled).unwrap();
        assert_eq!(again.header().voucher_no, "JV-001-2");
        assert_eq!(again.header().amended_from.as_deref(), Some("JV-001-1"));
    }

    #[test]
    fn test_amend_requires_cancelled() {
        assert!(matches!(
            VoucherWorkflow::amend(&journal(), DocStatus::Submitted),
            Err(LedgerError::InvalidTransition { action: "amend", .. })
        ));
    }
}
