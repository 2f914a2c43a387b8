//! Error classification shared by every module error type.

use serde::{Deserialize, Serialize};

/// Broad category of a rejected operation.
///
/// Callers branch on this instead of matching individual variants: only
/// [`ErrorKind::Transient`] failures are worth retrying unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing field, malformed row or unbalanced set.
    Validation,
    /// Frozen account or period without the required role.
    Authorization,
    /// Structural or accounting invariant would break.
    Invariant,
    /// Outstanding on a document would drop below zero.
    OutstandingNegative,
    /// Lock contention outlasted the retry budget.
    Transient,
    /// Referenced account or document does not exist.
    NotFound,
    /// Operation not allowed in the document's current status.
    State,
}

impl ErrorKind {
    /// Returns true if retrying the whole call may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }
}
