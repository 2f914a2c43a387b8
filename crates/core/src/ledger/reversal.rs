//! Mirror rows for cancellation.
//!
//! Cancelling never deletes: each live row gets a mirror with debit and
//! credit swapped, pointing back at the row it reverses.

use tally_shared::types::EntryId;

use super::entry::LedgerEntry;

/// Stateless service for creating reversing rows.
pub struct ReversalService;

impl ReversalService {
    /// Creates the mirror of a single row.
    ///
    /// - Debit becomes credit and credit becomes debit
    /// - Voucher, account, party, against and posting date are preserved
    /// - Remarks are prefixed with "Reversal: "
    #[must_use]
    pub fn mirror(entry: &LedgerEntry) -> LedgerEntry {
        LedgerEntry {
            id: EntryId::new(),
            seq: 0,
            debit: entry.credit,
            credit: entry.debit,
            remarks: format!("Reversal: {}", entry.remarks),
            reverses: Some(entry.id),
            ..entry.clone()
        }
    }

    /// Mirrors every row of a set.
    #[must_use]
    pub fn mirror_all(entries: &[LedgerEntry]) -> Vec<LedgerEntry> {
        entries.iter().map(Self::mirror).collect()
    }
}
