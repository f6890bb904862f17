//! Property-based checks of the ledger invariants: conservation,
//! tag-transfer neutrality, continuity, and determinism.

mod common;

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use common::{day, inbound, outbound, tag_transfer, InMemoryEventStore};
use ricemill_ledger::models::pool;
use ricemill_ledger::{
    EngineConfig, EventScope, LedgerService, Outturn, PoolKey, StockEvent,
};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(future)
}

fn weight_kg(bags: i64) -> Decimal {
    Decimal::from(bags * 75)
}

/// (day offset 0..10, inbound?, bags 1..500)
fn movement_strategy() -> impl Strategy<Value = Vec<(u8, bool, i64)>> {
    prop::collection::vec((0u8..10, any::<bool>(), 1i64..500), 1..40)
}

fn movements_to_events(movements: &[(u8, bool, i64)], location: Uuid) -> Vec<StockEvent> {
    movements
        .iter()
        .enumerate()
        .map(|(seq, (offset, is_inbound, bags))| {
            let date = day(2024, 6, 1 + u32::from(*offset));
            if *is_inbound {
                inbound(date, seq as u32, "sona", location, *bags, weight_kg(*bags))
            } else {
                outbound(date, seq as u32, "sona", location, *bags, weight_kg(*bags))
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// With no tag-transfers in play, the sum over all pools after a full
    /// replay equals net(inbound - outbound).
    #[test]
    fn conservation_of_bags(movements in movement_strategy()) {
        let location = Uuid::new_v4();
        let mut store = InMemoryEventStore::new();
        let mut net = 0i64;
        for event in movements_to_events(&movements, location) {
            net += match event.kind {
                ricemill_ledger::EventKind::Inbound => event.quantity.bags,
                _ => -event.quantity.bags,
            };
            store.push(event);
        }
        let service = LedgerService::new(store, EngineConfig::default());

        let report = block_on(service.replay(
            &EventScope::all(),
            day(2024, 6, 1),
            day(2024, 6, 11),
        ))
        .unwrap();

        let closing = report.days.last().unwrap().closing_total;
        prop_assert_eq!(closing.bags, net);
    }

    /// A tag-transfer of A bags moves exactly A from the untagged pool to
    /// the tagged pool and leaves the system total unchanged.
    #[test]
    fn tag_transfer_neutrality(
        opening_bags in 0i64..1000,
        transfer_bags in 1i64..1000,
    ) {
        let location = Uuid::new_v4();
        let outturn = Outturn::new(Uuid::new_v4(), "OT-P", "sona");
        let mut store = InMemoryEventStore::new();
        store.add_outturn(outturn.clone());
        store.push(inbound(
            day(2024, 6, 1), 1, "sona", location, opening_bags, weight_kg(opening_bags),
        ));
        store.push(tag_transfer(
            day(2024, 6, 2), 1, "sona", location, outturn.id,
            transfer_bags, weight_kg(transfer_bags),
        ));
        let service = LedgerService::new(store, EngineConfig::default());

        let report = block_on(service.replay(
            &EventScope::all(),
            day(2024, 6, 1),
            day(2024, 6, 2),
        ))
        .unwrap();

        let day2 = &report.days[1];
        let untagged = day2.closing[&PoolKey::untagged("sona", location)];
        let tagged = day2.closing[&PoolKey::tagged("sona", outturn.id)];
        prop_assert_eq!(untagged.bags, opening_bags - transfer_bags);
        prop_assert_eq!(tagged.bags, transfer_bags);
        prop_assert_eq!(pool::total(&day2.closing).bags, opening_bags);
        prop_assert_eq!(day2.closing_total, day2.opening_total);
    }

    /// closing(D) == opening(D+1) for every key over any contiguous range.
    #[test]
    fn continuity_across_days(movements in movement_strategy()) {
        let location = Uuid::new_v4();
        let mut store = InMemoryEventStore::new();
        for event in movements_to_events(&movements, location) {
            store.push(event);
        }
        let service = LedgerService::new(store, EngineConfig::default());

        let report = block_on(service.replay(
            &EventScope::all(),
            day(2024, 6, 1),
            day(2024, 6, 11),
        ))
        .unwrap();

        for pair in report.days.windows(2) {
            prop_assert_eq!(&pair[0].closing, &pair[1].opening);
        }
    }

    /// Re-running the same computation over an unchanged event set gives a
    /// bit-identical report.
    #[test]
    fn replay_and_balance_are_deterministic(movements in movement_strategy()) {
        let location = Uuid::new_v4();
        let mut store = InMemoryEventStore::new();
        for event in movements_to_events(&movements, location) {
            store.push(event);
        }
        let service = LedgerService::new(store, EngineConfig::default());

        let first = block_on(service.replay(
            &EventScope::all(), day(2024, 6, 1), day(2024, 6, 11),
        )).unwrap();
        let second = block_on(service.replay(
            &EventScope::all(), day(2024, 6, 1), day(2024, 6, 11),
        )).unwrap();
        prop_assert_eq!(first, second);

        let balance_a = block_on(service.balance_as_of(&EventScope::all(), day(2024, 6, 11))).unwrap();
        let balance_b = block_on(service.balance_as_of(&EventScope::all(), day(2024, 6, 11))).unwrap();
        prop_assert_eq!(balance_a, balance_b);
    }
}
