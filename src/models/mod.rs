// Domain model: events plus the dimensions the pool key is built from.
pub mod event;
pub mod location;
pub mod outturn;
pub mod packaging;
pub mod pool;

pub use event::{EventKind, EventStatus, ProductCategory, StockEvent};
pub use location::Location;
pub use outturn::{Outturn, OutturnMetrics};
pub use packaging::Packaging;
pub use pool::{PoolKey, PoolMap, Quantity};
