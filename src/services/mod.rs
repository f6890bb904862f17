// Reconstruction engine
pub mod replay;
pub mod resolver;

// Replay specializations
pub mod balance;

// Derived metrics (average rate, yield)
pub mod metrics;

pub use balance::BalanceReport;
pub use replay::{DayRecord, LedgerReport, LedgerService};
