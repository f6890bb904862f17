//! Per-kind pool transforms: one deterministic, pure function per event
//! kind, applied to the running pool map. No I/O, no clock, no randomness.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::EngineConfig;
use crate::errors::{LedgerError, LedgerWarning};
use crate::models::event::{EventKind, ProductCategory, StockEvent};
use crate::models::packaging::KG_PER_QUINTAL;
use crate::models::pool::{self, PoolKey, PoolMap, Quantity};
use crate::queries::ReferenceData;

/// Paddy bags charged against a batch for producing `output_quintals` of a
/// given product. Loss-only categories (the bran class) charge nothing.
/// Rounding is half-up per the mill's convention.
pub fn paddy_bags_deducted(
    output_quintals: Decimal,
    category: ProductCategory,
    config: &EngineConfig,
) -> i64 {
    if category.is_loss_only() {
        return 0;
    }
    (output_quintals / config.recovery_ratio)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// A paddy amount expressed as bags plus its standard-bag weight in quintals.
fn paddy_quantity(bags: i64, config: &EngineConfig) -> Quantity {
    Quantity::new(
        bags,
        Decimal::from(bags) * config.paddy_kg_per_bag / KG_PER_QUINTAL,
    )
}

fn require<T>(value: Option<T>, event: &StockEvent, field: &str) -> Result<T, LedgerError> {
    value.ok_or_else(|| LedgerError::InvalidEvent {
        event_id: event.id,
        reason: format!("{} is required for {} events", field, event.kind),
    })
}

/// Debits a pool and records a warning if the balance just went negative.
fn debit_with_warning(
    pools: &mut PoolMap,
    key: PoolKey,
    delta: Quantity,
    event: &StockEvent,
    warnings: &mut Vec<LedgerWarning>,
) {
    let before = pools.get(&key).copied().unwrap_or(Quantity::ZERO);
    let after = pool::debit(pools, key.clone(), delta);
    if after.is_negative() && !before.is_negative() {
        warnings.push(LedgerWarning::NegativeBalance {
            key,
            date: event.date,
            bags: after.bags,
        });
    }
}

/// Applies one event to the pool map.
///
/// `MissingEntity` errors are fatal for this event only; the caller skips
/// the event and attaches a warning. `InvalidEvent` and anything else
/// indicates structurally bad input.
pub fn apply_event(
    pools: &mut PoolMap,
    event: &StockEvent,
    refs: &ReferenceData,
    config: &EngineConfig,
    warnings: &mut Vec<LedgerWarning>,
) -> Result<(), LedgerError> {
    event.validate_shape()?;

    match event.kind {
        EventKind::Inbound => {
            let location = require(event.target_location, event, "target location")?;
            let key = match event.target_packaging_id {
                Some(packaging) => PoolKey::packed(&event.variety, location, packaging),
                None => PoolKey::untagged(&event.variety, location),
            };
            pool::credit(pools, key, event.quantity);
        }

        EventKind::Outbound => {
            let location = require(event.source_location, event, "source location")?;
            let key = match event.source_packaging_id {
                Some(packaging) => PoolKey::packed(&event.variety, location, packaging),
                None => PoolKey::untagged(&event.variety, location),
            };
            debit_with_warning(pools, key, event.quantity, event, warnings);
        }

        EventKind::TagTransfer => {
            let location = require(event.source_location, event, "source location")?;
            let outturn_id = require(event.outturn_id, event, "outturn")?;
            // Lookup validates the reference before the tagged pool is keyed on it.
            let outturn = refs.outturn(event.id, outturn_id)?;

            let untagged = PoolKey::untagged(&event.variety, location);
            let tagged = PoolKey::tagged(&event.variety, outturn.id);
            debit_with_warning(pools, untagged, event.quantity, event, warnings);
            pool::credit(pools, tagged, event.quantity);
        }

        EventKind::Consumption => {
            let outturn_id = require(event.outturn_id, event, "outturn")?;
            let category = require(event.product_category, event, "product category")?;
            let outturn = refs.outturn(event.id, outturn_id)?;

            let deducted = paddy_bags_deducted(event.quantity.weight, category, config);
            let tagged = PoolKey::tagged(&outturn.allotted_variety, outturn.id);
            debit_with_warning(
                pools,
                tagged,
                paddy_quantity(deducted, config),
                event,
                warnings,
            );
        }

        EventKind::Conversion => {
            let location = require(event.source_location, event, "location")?;
            let source_id = require(event.source_packaging_id, event, "source packaging")?;
            let target_id = require(event.target_packaging_id, event, "target packaging")?;
            let source_pack = refs.packaging(event.id, source_id)?;
            let target_pack = refs.packaging(event.id, target_id)?;

            // The event quantity is the gross amount taken out of the source
            // packaging; the shortage is spillage that leaves the system.
            let gross_kg = source_pack.kg_of(event.quantity.bags);
            let shortage_kg = event.shortage_weight * KG_PER_QUINTAL;
            let converted_kg = gross_kg - shortage_kg;
            let target_bags = target_pack.whole_bags_from_kg(converted_kg);

            let source_key = PoolKey::packed(&event.variety, location, source_pack.id);
            let target_key = PoolKey::packed(&event.variety, location, target_pack.id);
            debit_with_warning(
                pools,
                source_key,
                Quantity::new(event.quantity.bags, gross_kg / KG_PER_QUINTAL),
                event,
                warnings,
            );
            pool::credit(
                pools,
                target_key,
                Quantity::new(target_bags, converted_kg / KG_PER_QUINTAL),
            );
        }

        EventKind::Clearing => {
            let outturn_id = require(event.outturn_id, event, "outturn")?;
            let outturn = refs.outturn(event.id, outturn_id)?;

            // Terminal consumption of whatever remains tagged to the batch,
            // negative remainders included.
            let remaining: Vec<PoolKey> = pools
                .keys()
                .filter(|key| key.outturn == Some(outturn.id))
                .cloned()
                .collect();
            for key in remaining {
                if let Some(balance) = pools.get(&key).copied() {
                    pool::debit(pools, key, balance);
                }
            }
        }
    }

    Ok(())
}

/// Applies an event, downgrading per-event failures to a skip plus warning.
///
/// Unresolvable references and shape failures exclude that one event; a
/// schema-level problem like an unsupported kind propagates and aborts the
/// whole computation.
pub(crate) fn apply_or_skip(
    pools: &mut PoolMap,
    event: &StockEvent,
    refs: &ReferenceData,
    config: &EngineConfig,
    warnings: &mut Vec<LedgerWarning>,
) -> Result<bool, LedgerError> {
    match apply_event(pools, event, refs, config, warnings) {
        Ok(()) => Ok(true),
        Err(err @ (LedgerError::MissingEntity { .. } | LedgerError::InvalidEvent { .. })) => {
            tracing::warn!(event_id = %event.id, %err, "excluding event from replay");
            warnings.push(LedgerWarning::SkippedEvent {
                event_id: event.id,
                reason: err.to_string(),
            });
            Ok(false)
        }
        Err(err) => Err(err),
    }
}
