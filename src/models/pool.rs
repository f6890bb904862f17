use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use uuid::Uuid;

/// A stock amount: whole bags plus weight in quintals.
///
/// Negative values are representable on purpose; the engine reports
/// inconsistent data rather than rejecting it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    pub bags: i64,
    pub weight: Decimal,
}

impl Quantity {
    pub const ZERO: Quantity = Quantity {
        bags: 0,
        weight: Decimal::ZERO,
    };

    pub fn new(bags: i64, weight: Decimal) -> Self {
        Self { bags, weight }
    }

    pub fn is_zero(&self) -> bool {
        self.bags == 0 && self.weight.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.bags < 0 || self.weight.is_sign_negative() && !self.weight.is_zero()
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity {
            bags: self.bags + rhs.bags,
            weight: self.weight + rhs.weight,
        }
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        self.bags += rhs.bags;
        self.weight += rhs.weight;
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity {
            bags: self.bags - rhs.bags,
            weight: self.weight - rhs.weight,
        }
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, rhs: Quantity) {
        self.bags -= rhs.bags;
        self.weight -= rhs.weight;
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bags / {} qtl", self.bags, self.weight)
    }
}

/// Composite key of one computed stock pool.
///
/// Untagged location stock carries a `location` and no `outturn`; stock
/// tagged to a production batch carries an `outturn`; packaged finished
/// goods additionally carry a `packaging`. `Ord` is derived so pool maps
/// iterate and serialize in a deterministic order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub variety: String,
    pub location: Option<Uuid>,
    pub outturn: Option<Uuid>,
    pub packaging: Option<Uuid>,
}

impl PoolKey {
    /// Generic location stock, not attributed to any batch.
    pub fn untagged(variety: impl Into<String>, location: Uuid) -> Self {
        Self {
            variety: variety.into(),
            location: Some(location),
            outturn: None,
            packaging: None,
        }
    }

    /// Stock attributed to a production batch.
    pub fn tagged(variety: impl Into<String>, outturn: Uuid) -> Self {
        Self {
            variety: variety.into(),
            location: None,
            outturn: Some(outturn),
            packaging: None,
        }
    }

    /// Packaged finished goods at a location.
    pub fn packed(variety: impl Into<String>, location: Uuid, packaging: Uuid) -> Self {
        Self {
            variety: variety.into(),
            location: Some(location),
            outturn: None,
            packaging: Some(packaging),
        }
    }

    pub fn is_tagged(&self) -> bool {
        self.outturn.is_some()
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.variety)?;
        match self.location {
            Some(location) => write!(f, "@{}", location)?,
            None => write!(f, "@untagged")?,
        }
        if let Some(outturn) = self.outturn {
            write!(f, "/ot:{}", outturn)?;
        }
        if let Some(packaging) = self.packaging {
            write!(f, "/pack:{}", packaging)?;
        }
        Ok(())
    }
}

/// The running state of a replay: every pool the scoped history touched.
pub type PoolMap = BTreeMap<PoolKey, Quantity>;

/// Adds `delta` to a pool, creating it at zero first if absent.
pub fn credit(pools: &mut PoolMap, key: PoolKey, delta: Quantity) -> Quantity {
    let entry = pools.entry(key).or_insert(Quantity::ZERO);
    *entry += delta;
    *entry
}

/// Subtracts `delta` from a pool, creating it at zero first if absent.
/// The pool may go negative; the caller decides whether to warn.
pub fn debit(pools: &mut PoolMap, key: PoolKey, delta: Quantity) -> Quantity {
    let entry = pools.entry(key).or_insert(Quantity::ZERO);
    *entry -= delta;
    *entry
}

/// Sum of every pool in the map.
pub fn total(pools: &PoolMap) -> Quantity {
    pools
        .values()
        .fold(Quantity::ZERO, |acc, balance| acc + *balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn debit_below_zero_is_allowed() {
        let mut pools = PoolMap::new();
        let key = PoolKey::untagged("sona", Uuid::nil());
        let after = debit(&mut pools, key.clone(), Quantity::new(5, dec!(3.75)));
        assert_eq!(after.bags, -5);
        assert!(after.is_negative());
        assert_eq!(pools[&key].bags, -5);
    }

    #[test]
    fn total_sums_every_pool() {
        let mut pools = PoolMap::new();
        credit(
            &mut pools,
            PoolKey::untagged("sona", Uuid::nil()),
            Quantity::new(10, dec!(7.5)),
        );
        credit(
            &mut pools,
            PoolKey::tagged("sona", Uuid::nil()),
            Quantity::new(4, dec!(3)),
        );
        let sum = total(&pools);
        assert_eq!(sum.bags, 14);
        assert_eq!(sum.weight, dec!(10.5));
    }

    #[test]
    fn key_ordering_is_stable() {
        let a = PoolKey::untagged("basmati", Uuid::nil());
        let b = PoolKey::untagged("sona", Uuid::nil());
        assert!(a < b);
    }
}
