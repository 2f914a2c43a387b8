//! Outstanding balances and the linking of payments to documents.

pub mod advances;
pub mod allocation;
pub mod outstanding;

pub use advances::{AdvanceLine, allocate_fifo, collect_advances};
pub use allocation::{Allocation, AllocationPlanner, Side};
pub use outstanding::OutstandingCalculator;
