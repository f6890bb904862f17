//! Rice-mill stock ledger reconstruction engine.
//!
//! Given an append-only history of heterogeneous inventory events (arrivals,
//! shifting, milling, packaging conversions, sales, batch closures), this
//! crate computes the opening/closing quantity of every tracked stock pool
//! for any date range or single cutoff date, plus the derived milling
//! metrics (weighted average rate, yield percentage).
//!
//! The engine is stateless and recompute-on-read: each call performs one
//! query against an external [`queries::EventStore`], then runs as a pure
//! function of the fetched events. It owns no network protocol, no file
//! format, and no persistence.
//!
//! ```no_run
//! # use ricemill_ledger::{config::EngineConfig, queries::EventScope, services::LedgerService};
//! # async fn example<S: ricemill_ledger::queries::EventStore>(store: S) -> Result<(), ricemill_ledger::errors::LedgerError> {
//! let service = LedgerService::new(store, EngineConfig::default());
//! let scope = EventScope::all().for_variety("sona");
//! let from = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let to = chrono::NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
//! let report = service.replay(&scope, from, to).await?;
//! for day in &report.days {
//!     println!("{}: {} -> {}", day.date, day.opening_total, day.closing_total);
//! }
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod models;
pub mod queries;
pub mod services;

pub use config::EngineConfig;
pub use errors::{LedgerError, LedgerWarning};
pub use models::{
    EventKind, EventStatus, Location, Outturn, OutturnMetrics, Packaging, PoolKey, PoolMap,
    ProductCategory, Quantity, StockEvent,
};
pub use queries::{EventScope, EventStore};
pub use services::{BalanceReport, DayRecord, LedgerReport, LedgerService};
