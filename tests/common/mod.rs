//! Shared fixtures: an in-memory event store and event builders that speak
//! the store's native units (weights in kg, the engine normalizes).
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use ricemill_ledger::errors::LedgerError;
use ricemill_ledger::models::{
    EventKind, EventStatus, Outturn, Packaging, ProductCategory, Quantity, StockEvent,
};
use ricemill_ledger::queries::{EventScope, EventStore};

/// Installs a test subscriber once so `RUST_LOG=debug cargo test` shows the
/// engine's spans.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// In-memory stand-in for the persistent event store. Read-only, like the
/// real thing as seen from the engine.
#[derive(Default)]
pub struct InMemoryEventStore {
    pub events: Vec<StockEvent>,
    pub outturns: HashMap<Uuid, Outturn>,
    pub packagings: HashMap<Uuid, Packaging>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: StockEvent) {
        self.events.push(event);
    }

    pub fn add_outturn(&mut self, outturn: Outturn) {
        self.outturns.insert(outturn.id, outturn);
    }

    pub fn add_packaging(&mut self, packaging: Packaging) {
        self.packagings.insert(packaging.id, packaging);
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn approved_events(
        &self,
        scope: &EventScope,
        until: Option<NaiveDate>,
    ) -> Result<Vec<StockEvent>, LedgerError> {
        let mut events: Vec<StockEvent> = self
            .events
            .iter()
            .filter(|event| event.status == EventStatus::Approved)
            .filter(|event| scope.matches(event))
            .filter(|event| until.map_or(true, |bound| event.date <= bound))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(events)
    }

    async fn outturn(&self, id: Uuid) -> Result<Option<Outturn>, LedgerError> {
        Ok(self.outturns.get(&id).cloned())
    }

    async fn packaging(&self, id: Uuid) -> Result<Option<Packaging>, LedgerError> {
        Ok(self.packagings.get(&id).cloned())
    }
}

pub fn day(year: i32, month: u32, dom: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, dom).unwrap()
}

/// Deterministic created-at stamp: `seq` seconds into the event's day.
pub fn stamp(date: NaiveDate, seq: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, seq).unwrap())
}

fn base_event(kind: EventKind, date: NaiveDate, seq: u32, variety: &str) -> StockEvent {
    StockEvent {
        id: Uuid::new_v4(),
        date,
        created_at: stamp(date, seq),
        kind,
        status: EventStatus::Approved,
        variety: variety.to_string(),
        quantity: Quantity::ZERO,
        rate: None,
        source_location: None,
        target_location: None,
        outturn_id: None,
        source_packaging_id: None,
        target_packaging_id: None,
        product_category: None,
        shortage_weight: Decimal::ZERO,
    }
}

pub fn inbound(
    date: NaiveDate,
    seq: u32,
    variety: &str,
    location: Uuid,
    bags: i64,
    weight_kg: Decimal,
) -> StockEvent {
    let mut event = base_event(EventKind::Inbound, date, seq, variety);
    event.target_location = Some(location);
    event.quantity = Quantity::new(bags, weight_kg);
    event
}

pub fn purchase(
    date: NaiveDate,
    seq: u32,
    variety: &str,
    location: Uuid,
    bags: i64,
    weight_kg: Decimal,
    rate: Decimal,
) -> StockEvent {
    let mut event = inbound(date, seq, variety, location, bags, weight_kg);
    event.rate = Some(rate);
    event
}

pub fn outbound(
    date: NaiveDate,
    seq: u32,
    variety: &str,
    location: Uuid,
    bags: i64,
    weight_kg: Decimal,
) -> StockEvent {
    let mut event = base_event(EventKind::Outbound, date, seq, variety);
    event.source_location = Some(location);
    event.quantity = Quantity::new(bags, weight_kg);
    event
}

pub fn tag_transfer(
    date: NaiveDate,
    seq: u32,
    variety: &str,
    location: Uuid,
    outturn: Uuid,
    bags: i64,
    weight_kg: Decimal,
) -> StockEvent {
    let mut event = base_event(EventKind::TagTransfer, date, seq, variety);
    event.source_location = Some(location);
    event.outturn_id = Some(outturn);
    event.quantity = Quantity::new(bags, weight_kg);
    event
}

pub fn consumption(
    date: NaiveDate,
    seq: u32,
    variety: &str,
    outturn: Uuid,
    category: ProductCategory,
    output_bags: i64,
    output_kg: Decimal,
) -> StockEvent {
    let mut event = base_event(EventKind::Consumption, date, seq, variety);
    event.outturn_id = Some(outturn);
    event.product_category = Some(category);
    event.quantity = Quantity::new(output_bags, output_kg);
    event
}

pub fn conversion(
    date: NaiveDate,
    seq: u32,
    variety: &str,
    location: Uuid,
    source_packaging: Uuid,
    target_packaging: Uuid,
    bags: i64,
    weight_kg: Decimal,
    shortage_kg: Decimal,
) -> StockEvent {
    let mut event = base_event(EventKind::Conversion, date, seq, variety);
    event.source_location = Some(location);
    event.source_packaging_id = Some(source_packaging);
    event.target_packaging_id = Some(target_packaging);
    event.quantity = Quantity::new(bags, weight_kg);
    event.shortage_weight = shortage_kg;
    event
}

pub fn clearing(date: NaiveDate, seq: u32, variety: &str, outturn: Uuid) -> StockEvent {
    let mut event = base_event(EventKind::Clearing, date, seq, variety);
    event.outturn_id = Some(outturn);
    event
}
