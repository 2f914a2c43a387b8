//! Ledger reports.

pub mod service;
pub mod types;

pub use service::ReportService;
pub use types::{TrialBalanceReport, TrialBalanceRow, TrialBalanceTotals};
