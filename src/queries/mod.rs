//! Read-only boundary to the external event store.
//!
//! The engine performs exactly one round of queries per computation and is
//! pure after that. The store owns write-time validation; nothing on this
//! read path rejects business-inconsistent data.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::{LedgerError, MissingEntityKind};
use crate::models::{Outturn, Packaging, StockEvent};

/// Entity filter for a ledger computation: which slice of history to replay.
/// Date bounds are passed separately by each operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventScope {
    pub variety: Option<String>,
    pub location: Option<Uuid>,
    pub outturn: Option<Uuid>,
}

impl EventScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_variety(mut self, variety: impl Into<String>) -> Self {
        self.variety = Some(variety.into());
        self
    }

    pub fn at_location(mut self, location: Uuid) -> Self {
        self.location = Some(location);
        self
    }

    pub fn for_outturn(mut self, outturn: Uuid) -> Self {
        self.outturn = Some(outturn);
        self
    }

    /// Whether an event falls inside this scope. Location filters match
    /// either end of the event so transfers stay visible to both sides.
    pub fn matches(&self, event: &StockEvent) -> bool {
        if let Some(variety) = &self.variety {
            if &event.variety != variety {
                return false;
            }
        }
        if let Some(location) = self.location {
            if event.source_location != Some(location) && event.target_location != Some(location) {
                return false;
            }
        }
        if let Some(outturn) = self.outturn {
            if event.outturn_id != Some(outturn) {
                return false;
            }
        }
        true
    }
}

/// The external persistent event store, seen through the narrowest possible
/// read interface.
///
/// Implementations must return only approved events, filtered to the scope
/// and to `date <= until` when an upper bound is given. Ordering by
/// `(date, created_at)` ascending is the contract, but the engine re-sorts
/// defensively since that ordering is the single source of determinism for
/// every downstream computation.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn approved_events(
        &self,
        scope: &EventScope,
        until: Option<NaiveDate>,
    ) -> Result<Vec<StockEvent>, LedgerError>;

    async fn outturn(&self, id: Uuid) -> Result<Option<Outturn>, LedgerError>;

    async fn packaging(&self, id: Uuid) -> Result<Option<Packaging>, LedgerError>;
}

/// Reference entities resolved up front for one computation, so the replay
/// itself never suspends.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub outturns: HashMap<Uuid, Outturn>,
    pub packagings: HashMap<Uuid, Packaging>,
}

impl ReferenceData {
    /// Loads every outturn and packaging the event list references. Entities
    /// the store cannot resolve are simply absent; the resolver raises
    /// per-event `MissingEntity` when it actually needs one.
    pub async fn load<S: EventStore + ?Sized>(
        store: &S,
        events: &[StockEvent],
    ) -> Result<Self, LedgerError> {
        let mut refs = Self::default();
        for event in events {
            if let Some(id) = event.outturn_id {
                if !refs.outturns.contains_key(&id) {
                    if let Some(outturn) = store.outturn(id).await? {
                        refs.outturns.insert(id, outturn);
                    }
                }
            }
            for id in [event.source_packaging_id, event.target_packaging_id]
                .into_iter()
                .flatten()
            {
                if !refs.packagings.contains_key(&id) {
                    if let Some(packaging) = store.packaging(id).await? {
                        refs.packagings.insert(id, packaging);
                    }
                }
            }
        }
        Ok(refs)
    }

    pub fn outturn(&self, event_id: Uuid, id: Uuid) -> Result<&Outturn, LedgerError> {
        self.outturns.get(&id).ok_or(LedgerError::MissingEntity {
            event_id,
            entity: MissingEntityKind::Outturn,
        })
    }

    pub fn packaging(&self, event_id: Uuid, id: Uuid) -> Result<&Packaging, LedgerError> {
        self.packagings.get(&id).ok_or(LedgerError::MissingEntity {
            event_id,
            entity: MissingEntityKind::Packaging,
        })
    }
}

/// Stable event ordering: the determinism contract for the whole engine.
pub fn sort_events(events: &mut [StockEvent]) {
    events.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}
