use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const KG_PER_QUINTAL: Decimal = dec!(100);

/// A container specification for finished goods. The kg-per-bag ratio drives
/// packaging conversions and bag/quintal arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packaging {
    pub id: Uuid,
    pub brand: String,
    pub kg_per_bag: Decimal,
}

impl Packaging {
    pub fn new(id: Uuid, brand: impl Into<String>, kg_per_bag: Decimal) -> Self {
        Self {
            id,
            brand: brand.into(),
            kg_per_bag,
        }
    }

    /// Weight of `bags` bags of this packaging, in kg.
    pub fn kg_of(&self, bags: i64) -> Decimal {
        Decimal::from(bags) * self.kg_per_bag
    }

    /// Weight of `bags` bags of this packaging, in quintals.
    pub fn quintals_of(&self, bags: i64) -> Decimal {
        self.kg_of(bags) / KG_PER_QUINTAL
    }

    /// Whole bags of this packaging that `kg` of product fills.
    pub fn whole_bags_from_kg(&self, kg: Decimal) -> i64 {
        (kg / self.kg_per_bag).floor().to_i64().unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quintal_conversion() {
        let pack = Packaging::new(Uuid::new_v4(), "Gold", dec!(26));
        assert_eq!(pack.kg_of(10), dec!(260));
        assert_eq!(pack.quintals_of(10), dec!(2.6));
    }

    #[test]
    fn whole_bags_floor() {
        let pack = Packaging::new(Uuid::new_v4(), "Gold", dec!(26));
        assert_eq!(pack.whole_bags_from_kg(dec!(498)), 19);
        assert_eq!(pack.whole_bags_from_kg(dec!(25.9)), 0);
    }
}
