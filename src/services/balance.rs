//! Point-in-time balances: the replay specialization that skips day-by-day
//! snapshotting and honors cleared-batch exclusion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::{LedgerError, LedgerWarning};
use crate::models::pool::PoolMap;
use crate::queries::{EventScope, EventStore};
use crate::services::replay::LedgerService;
use crate::services::resolver;

/// Balances of every pool in scope as of the end of the cutoff day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub cutoff: NaiveDate,
    pub pools: PoolMap,
    pub warnings: Vec<LedgerWarning>,
}

impl<S: EventStore> LedgerService<S> {
    /// Sums the net effect of every eligible event dated on or before
    /// `cutoff` — the cutoff day itself is included, so the result equals
    /// that day's closing snapshot from [`LedgerService::replay`].
    ///
    /// Cleared-batch exclusion: once a batch's books are closed, an event
    /// dated strictly after the closure date contributes nothing to any
    /// balance, for any cutoff. Late postings against a cleared batch are
    /// retroactively void.
    #[instrument(skip(self))]
    pub async fn balance_as_of(
        &self,
        scope: &EventScope,
        cutoff: NaiveDate,
    ) -> Result<BalanceReport, LedgerError> {
        let (events, refs) = self.fetch_scope(scope, Some(cutoff)).await?;

        let mut warnings = Vec::new();
        let mut pools = PoolMap::new();
        for event in &events {
            let voided = event
                .outturn_id
                .and_then(|id| refs.outturns.get(&id))
                .map_or(false, |outturn| outturn.excludes_posting_on(event.date));
            if voided {
                debug!(event_id = %event.id, "posting dated after batch clearance, excluded");
                continue;
            }
            resolver::apply_or_skip(&mut pools, event, &refs, &self.config, &mut warnings)?;
        }

        Ok(BalanceReport {
            cutoff,
            pools,
            warnings,
        })
    }
}
