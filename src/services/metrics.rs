//! Derived metrics over the same event stream: weighted average purchase
//! rate and milling yield. Always full scans — correctness over throughput.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::models::event::EventKind;
use crate::models::outturn::OutturnMetrics;
use crate::queries::{EventScope, EventStore};
use crate::services::replay::LedgerService;

impl<S: EventStore> LedgerService<S> {
    /// Weighted average purchase rate over the scope:
    /// Σ(rate·bags) / Σ(bags) across inbound events that carry a rate.
    /// Returns zero when no qualifying purchase exists.
    #[instrument(skip(self))]
    pub async fn average_rate(&self, scope: &EventScope) -> Result<Decimal, LedgerError> {
        let (events, _) = self.fetch_scope(scope, None).await?;
        Ok(weighted_average_rate(events.iter().filter_map(|event| {
            match (event.kind, event.rate) {
                (EventKind::Inbound, Some(rate)) => Some((rate, event.quantity.bags)),
                _ => None,
            }
        })))
    }

    /// Recomputes the denormalized metrics for one outturn from scratch:
    /// yield = 100 × Σ(output quintals) / Σ(paddy input quintals tagged to
    /// the batch), plus the weighted average rate of its tagged purchases.
    ///
    /// The returned value is for the caller to cache on the batch row; the
    /// cache is never a source of truth and any consumer may call this again.
    #[instrument(skip(self))]
    pub async fn yield_percentage(&self, outturn_id: Uuid) -> Result<OutturnMetrics, LedgerError> {
        self.store.outturn(outturn_id).await?.ok_or_else(|| {
            LedgerError::InvalidRequest(format!("outturn {} not found", outturn_id))
        })?;

        let scope = EventScope::all().for_outturn(outturn_id);
        let (events, _) = self.fetch_scope(&scope, None).await?;

        let mut input_quintals = Decimal::ZERO;
        let mut output_quintals = Decimal::ZERO;
        for event in &events {
            match event.kind {
                EventKind::TagTransfer => input_quintals += event.quantity.weight,
                EventKind::Consumption => output_quintals += event.quantity.weight,
                _ => {}
            }
        }

        let yield_percentage = if input_quintals.is_zero() {
            Decimal::ZERO
        } else {
            dec!(100) * output_quintals / input_quintals
        };

        let average_rate = weighted_average_rate(events.iter().filter_map(|event| {
            match (event.kind, event.rate) {
                (EventKind::Inbound, Some(rate)) => Some((rate, event.quantity.bags)),
                _ => None,
            }
        }));

        Ok(OutturnMetrics {
            outturn_id,
            yield_percentage,
            average_rate,
            computed_at: Utc::now(),
        })
    }
}

fn weighted_average_rate(rated: impl Iterator<Item = (Decimal, i64)>) -> Decimal {
    let mut weighted_sum = Decimal::ZERO;
    let mut total_bags = Decimal::ZERO;
    for (rate, bags) in rated {
        weighted_sum += rate * Decimal::from(bags);
        total_bags += Decimal::from(bags);
    }
    if total_bags.is_zero() {
        Decimal::ZERO
    } else {
        weighted_sum / total_bags
    }
}
