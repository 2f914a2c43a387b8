//! Common types used across the workspace.

pub mod id;
pub mod money;
pub mod role;

pub use id::*;
pub use money::{AMOUNT_SCALE, DebitCredit, round_amount};
pub use role::RoleSet;
