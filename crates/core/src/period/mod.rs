//! Period-close and account-freeze authorization.

pub mod guard;

pub use guard::PeriodGuard;
