use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::models::pool::Quantity;

/// The closed set of inventory event kinds the engine understands.
///
/// Anything else coming out of the event store is a schema mismatch and must
/// surface as [`LedgerError::UnsupportedEventKind`], never be skipped.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// Purchase, shift-in, or loose-in: stock arriving at a location.
    Inbound,
    /// Shift-out or sale: stock leaving a location.
    Outbound,
    /// Moving untagged location stock into a batch's tagged pool.
    TagTransfer,
    /// Milling output recorded against a batch; charges paddy bags.
    Consumption,
    /// Packaging repack ("palti") between container sizes.
    Conversion,
    /// Batch closure: terminal consumption of all remaining tagged stock.
    Clearing,
}

impl EventKind {
    /// Parses a store-level kind string, mapping unknown values to the fatal
    /// schema-mismatch error.
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        Self::from_str(raw).map_err(|_| LedgerError::UnsupportedEventKind {
            kind: raw.to_string(),
        })
    }
}

/// Event approval status; only approved events are eligible for replay.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Approved,
    Pending,
    Rejected,
}

/// Closed set of milled product categories, replacing the substring matching
/// the legacy reports did on free-form product-type names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Rice,
    BrokenRice,
    Bran,
    Husk,
    Paddy,
    Other,
}

impl ProductCategory {
    /// Loss-only outputs (the bran class) charge no paddy bags against the
    /// batch; they are recorded for yield but deduct nothing.
    pub fn is_loss_only(&self) -> bool {
        matches!(self, ProductCategory::Bran | ProductCategory::Husk)
    }
}

/// One immutable inventory-affecting fact.
///
/// Events are append-only; an edit in the source system shows up here as a
/// new event. Which optional fields must be present depends on `kind` and is
/// checked by [`StockEvent::validate_shape`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEvent {
    pub id: Uuid,
    /// Calendar day the event belongs to on the ledger.
    pub date: NaiveDate,
    /// Fine-grained ordering tiebreak within a day.
    pub created_at: DateTime<Utc>,
    pub kind: EventKind,
    pub status: EventStatus,
    pub variety: String,
    pub quantity: Quantity,
    /// Per-bag purchase rate; present only on purchase-style inbound events.
    pub rate: Option<Decimal>,
    pub source_location: Option<Uuid>,
    pub target_location: Option<Uuid>,
    pub outturn_id: Option<Uuid>,
    pub source_packaging_id: Option<Uuid>,
    pub target_packaging_id: Option<Uuid>,
    /// Output classification for consumption events.
    pub product_category: Option<ProductCategory>,
    /// Conversion spillage, in the same weight unit as `quantity.weight`.
    pub shortage_weight: Decimal,
}

impl StockEvent {
    /// Checks that the fields this event's kind requires are present.
    /// Shape failures are structural errors, not skippable data problems.
    pub fn validate_shape(&self) -> Result<(), LedgerError> {
        let missing = |reason: &str| LedgerError::InvalidEvent {
            event_id: self.id,
            reason: reason.to_string(),
        };

        if self.variety.trim().is_empty() {
            return Err(missing("variety must not be empty"));
        }

        match self.kind {
            EventKind::Inbound => {
                if self.target_location.is_none() {
                    return Err(missing("inbound event requires a target location"));
                }
            }
            EventKind::Outbound => {
                if self.source_location.is_none() {
                    return Err(missing("outbound event requires a source location"));
                }
            }
            EventKind::TagTransfer => {
                if self.source_location.is_none() {
                    return Err(missing("tag-transfer requires a source location"));
                }
                if self.outturn_id.is_none() {
                    return Err(missing("tag-transfer requires an outturn"));
                }
            }
            EventKind::Consumption => {
                if self.outturn_id.is_none() {
                    return Err(missing("consumption requires an outturn"));
                }
                if self.product_category.is_none() {
                    return Err(missing("consumption requires a product category"));
                }
            }
            EventKind::Conversion => {
                if self.source_location.is_none() {
                    return Err(missing("conversion requires a location"));
                }
                if self.source_packaging_id.is_none() || self.target_packaging_id.is_none() {
                    return Err(missing("conversion requires source and target packaging"));
                }
            }
            EventKind::Clearing => {
                if self.outturn_id.is_none() {
                    return Err(missing("clearing requires an outturn"));
                }
            }
        }
        Ok(())
    }

    /// Converts stored weight units to quintals. Applied exactly once, at the
    /// query boundary; everything downstream assumes quintals.
    pub fn normalize_weights(mut self, units_per_quintal: Decimal) -> Self {
        self.quantity.weight /= units_per_quintal;
        self.shortage_weight /= units_per_quintal;
        self
    }
}
