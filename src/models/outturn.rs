use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A production batch (milling lot). Created open; transitions once to
/// cleared and is terminal after that — the engine never re-opens one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outturn {
    pub id: Uuid,
    pub code: String,
    pub allotted_variety: String,
    pub is_cleared: bool,
    pub cleared_at: Option<DateTime<Utc>>,
    /// Denormalized cache of the last computed yield; never a source of
    /// truth, any consumer may force recomputation.
    pub yield_percentage: Option<Decimal>,
    /// Denormalized cache of the last computed weighted average rate.
    pub average_rate: Option<Decimal>,
    pub metrics_computed_at: Option<DateTime<Utc>>,
}

impl Outturn {
    pub fn new(id: Uuid, code: impl Into<String>, allotted_variety: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            allotted_variety: allotted_variety.into(),
            is_cleared: false,
            cleared_at: None,
            yield_percentage: None,
            average_rate: None,
            metrics_computed_at: None,
        }
    }

    /// The last ledger day on which postings against this batch still count.
    pub fn books_closed_on(&self) -> Option<NaiveDate> {
        if self.is_cleared {
            self.cleared_at.map(|at| at.date_naive())
        } else {
            None
        }
    }

    /// True when a posting dated `date` lands after the books closed for
    /// this batch and must be excluded from balance computations.
    pub fn excludes_posting_on(&self, date: NaiveDate) -> bool {
        match self.books_closed_on() {
            Some(closed) => date > closed,
            None => false,
        }
    }
}

/// Freshly recomputed denormalized metrics for one outturn, handed back to
/// the caller to cache on the batch row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutturnMetrics {
    pub outturn_id: Uuid,
    pub yield_percentage: Decimal,
    pub average_rate: Decimal,
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn open_batch_excludes_nothing() {
        let outturn = Outturn::new(Uuid::new_v4(), "OT-1", "sona");
        assert!(!outturn.excludes_posting_on(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
    }

    #[test]
    fn cleared_batch_excludes_later_postings_only() {
        let mut outturn = Outturn::new(Uuid::new_v4(), "OT-1", "sona");
        outturn.is_cleared = true;
        outturn.cleared_at = Some(Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap());

        let on_close = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let after_close = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
        assert!(!outturn.excludes_posting_on(on_close));
        assert!(outturn.excludes_posting_on(after_close));
    }
}
