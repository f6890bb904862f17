use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::pool::PoolKey;

/// Which reference entity an event pointed at but the store could not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MissingEntityKind {
    Location,
    Outturn,
    Packaging,
}

/// Fatal errors surfaced by the ledger engine.
///
/// `MissingEntity` is fatal only for the single event that raised it: the
/// replay loop downgrades it to a [`LedgerWarning::SkippedEvent`] and keeps
/// going. Every other variant aborts the computation that produced it.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("event {event_id} references a {entity} that cannot be resolved")]
    MissingEntity {
        event_id: Uuid,
        entity: MissingEntityKind,
    },

    /// The store handed back an event kind outside the closed set. This is a
    /// schema/version mismatch, not bad data, so the whole replay aborts
    /// rather than silently corrupting totals.
    #[error("unsupported event kind '{kind}'")]
    UnsupportedEventKind { kind: String },

    #[error("event {event_id} is structurally invalid: {reason}")]
    InvalidEvent { event_id: Uuid, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("event store error: {0}")]
    Query(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Soft data problems attached to a report. The engine never raises for data
/// that is merely business-inconsistent; callers decide whether these are
/// alerts or noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerWarning {
    /// An event was excluded from the computation, with the reason why.
    SkippedEvent { event_id: Uuid, reason: String },

    /// A pool went below zero after applying an event. Negative stock is a
    /// write-time policy concern; replay only reports it.
    NegativeBalance {
        key: PoolKey,
        date: NaiveDate,
        bags: i64,
    },

    /// closing(D) != opening(D+1) for a key. Cannot happen within a single
    /// replay by construction, but can surface when seeding from prior
    /// history that is itself inconsistent.
    ContinuityBreak { key: PoolKey, date: NaiveDate },
}

impl std::fmt::Display for LedgerWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerWarning::SkippedEvent { event_id, reason } => {
                write!(f, "event {} skipped: {}", event_id, reason)
            }
            LedgerWarning::NegativeBalance { key, date, bags } => {
                write!(f, "pool {} went negative ({} bags) on {}", key, bags, date)
            }
            LedgerWarning::ContinuityBreak { key, date } => {
                write!(f, "continuity break for pool {} at {}", key, date)
            }
        }
    }
}
