//! Caller role sets.
//!
//! Roles are resolved by the caller's auth layer and injected per call;
//! this crate only tests membership.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The set of role names held by the caller of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    /// A caller holding no roles.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the caller holds `role`.
    #[must_use]
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    /// Iterates over role names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
