//! Day-by-day ledger reconstruction over a scoped, ordered event sequence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::errors::{LedgerError, LedgerWarning};
use crate::models::event::{EventKind, EventStatus, StockEvent};
use crate::models::pool::{self, PoolMap, Quantity};
use crate::queries::{sort_events, EventScope, EventStore, ReferenceData};
use crate::services::resolver;

/// One reported calendar day: opening state, the events applied that day
/// grouped by kind for display, and the closing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub opening: PoolMap,
    pub events_by_kind: BTreeMap<EventKind, Vec<StockEvent>>,
    pub closing: PoolMap,
    pub opening_total: Quantity,
    pub closing_total: Quantity,
}

/// Result of a replay: one record per day in the range, empty days included,
/// plus the soft warnings gathered along the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReport {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub days: Vec<DayRecord>,
    pub warnings: Vec<LedgerWarning>,
}

/// The reconstruction engine. Stateless and recompute-on-read: every call
/// builds its pool map from scratch out of one query against the store, so
/// concurrent calls never coordinate and a retried call restarts cleanly.
#[derive(Debug, Clone)]
pub struct LedgerService<S> {
    pub(crate) store: S,
    pub(crate) config: EngineConfig,
}

impl<S: EventStore> LedgerService<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Fetches the scoped history once, then normalizes weights to quintals
    /// and pins the (date, created_at) ordering every downstream computation
    /// depends on.
    pub(crate) async fn fetch_scope(
        &self,
        scope: &EventScope,
        until: Option<NaiveDate>,
    ) -> Result<(Vec<StockEvent>, ReferenceData), LedgerError> {
        let fetched = self.store.approved_events(scope, until).await?;
        let mut events: Vec<StockEvent> = fetched
            .into_iter()
            .filter(|event| event.status == EventStatus::Approved)
            .filter(|event| scope.matches(event))
            .filter(|event| until.map_or(true, |bound| event.date <= bound))
            .map(|event| event.normalize_weights(self.config.weight_units_per_quintal))
            .collect();
        sort_events(&mut events);

        let refs = ReferenceData::load(&self.store, &events).await?;
        Ok((events, refs))
    }

    /// Reconstructs the ledger for every calendar day in `[from, to]`.
    ///
    /// All eligible history strictly before `from` is replayed first to seed
    /// the opening stock of the first reported day. Days with no events still
    /// get a record so the continuity invariant holds across gaps.
    #[instrument(skip(self))]
    pub async fn replay(
        &self,
        scope: &EventScope,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<LedgerReport, LedgerError> {
        if from > to {
            return Err(LedgerError::InvalidRequest(format!(
                "date range start {} is after end {}",
                from, to
            )));
        }

        let (events, refs) = self.fetch_scope(scope, Some(to)).await?;
        let mut warnings = Vec::new();
        let mut pools = PoolMap::new();

        // Seed opening state from all prior history.
        let mut seeded = 0usize;
        for event in events.iter().filter(|event| event.date < from) {
            resolver::apply_or_skip(&mut pools, event, &refs, &self.config, &mut warnings)?;
            seeded += 1;
        }
        debug!(seeded, "seeded opening state from prior history");

        let mut days = Vec::new();
        let mut day = from;
        loop {
            let opening = pools.clone();
            let mut events_by_kind: BTreeMap<EventKind, Vec<StockEvent>> = BTreeMap::new();
            for event in events.iter().filter(|event| event.date == day) {
                let applied =
                    resolver::apply_or_skip(&mut pools, event, &refs, &self.config, &mut warnings)?;
                if applied {
                    events_by_kind
                        .entry(event.kind)
                        .or_default()
                        .push(event.clone());
                }
            }
            let closing = pools.clone();
            days.push(DayRecord {
                date: day,
                opening_total: pool::total(&opening),
                closing_total: pool::total(&closing),
                opening,
                events_by_kind,
                closing,
            });

            if day >= to {
                break;
            }
            day = day
                .succ_opt()
                .ok_or_else(|| LedgerError::InvalidRequest("date range overflow".to_string()))?;
        }

        check_continuity(&days, &mut warnings);

        Ok(LedgerReport {
            date_from: from,
            date_to: to,
            days,
            warnings,
        })
    }
}

/// Flags any key whose closing on day D differs from its opening on D+1.
/// Holds by construction within one replay; kept because seeded or partial
/// histories have surfaced breaks before.
fn check_continuity(days: &[DayRecord], warnings: &mut Vec<LedgerWarning>) {
    for pair in days.windows(2) {
        let (today, tomorrow) = (&pair[0], &pair[1]);
        let keys: std::collections::BTreeSet<_> =
            today.closing.keys().chain(tomorrow.opening.keys()).collect();
        for key in keys {
            let closing = today.closing.get(key).copied().unwrap_or(Quantity::ZERO);
            let opening = tomorrow.opening.get(key).copied().unwrap_or(Quantity::ZERO);
            if closing != opening {
                warnings.push(LedgerWarning::ContinuityBreak {
                    key: key.clone(),
                    date: tomorrow.date,
                });
            }
        }
    }
}
