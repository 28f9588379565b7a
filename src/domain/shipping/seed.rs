//! Reference Malaysian rate table: two zones, five shared weight bands.
//!
//! Base prices live once on the bands; the East Malaysia zone scales
//! them by its multiplier instead of duplicating the table. Serves as
//! merchant starter configuration and as the fixture the rate tests
//! exercise.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::shipping::zones::{
    RuleSet, RuleType, ServiceType, ShippingZone, WeightRule, ZoneRateTable,
};
use crate::domain::value_objects::Money;

const WEST_STATES: &[&str] = &[
    "JHR", "KDH", "KTN", "KUL", "MLK", "NSN", "PHG", "PJY", "PLS", "PNG", "PRK", "SGR", "TRG",
];
const EAST_STATES: &[&str] = &["SBH", "SWK", "LBN"];

/// Five ascending bands; `None` leaves the heaviest band unbounded.
const BANDS: &[(i64, Option<i64>, i64)] = &[
    // (min kg, max kg, base price in sen)
    (0, Some(1), 800),
    (1, Some(2), 1000),
    (2, Some(3), 1250),
    (3, Some(5), 1600),
    (5, None, 2500),
];

pub fn malaysia_default_table() -> ZoneRateTable {
    let west = ShippingZone {
        code: "WEST".into(),
        name: "West Malaysia".into(),
        states: WEST_STATES.iter().map(|s| s.to_string()).collect(),
        postcode_prefixes: ["0", "1", "2", "3", "4", "5", "6", "7"]
            .iter().map(|s| s.to_string()).collect(),
        multiplier: Decimal::ONE,
        delivery_days_min: 2,
        delivery_days_max: 4,
        is_active: true,
    };
    let east = ShippingZone {
        code: "EAST".into(),
        name: "East Malaysia".into(),
        states: EAST_STATES.iter().map(|s| s.to_string()).collect(),
        postcode_prefixes: ["87", "88", "89", "9"].iter().map(|s| s.to_string()).collect(),
        multiplier: Decimal::new(1875, 3),
        delivery_days_min: 4,
        delivery_days_max: 8,
        is_active: true,
    };

    let rule_set = RuleSet {
        id: Uuid::new_v4(),
        rule_type: RuleType::Standard,
        is_default: true,
        is_active: true,
        priority: 10,
        valid_from: None,
        valid_to: None,
        conditions: Vec::new(),
    };

    let mut weight_rules = Vec::new();
    for zone in [&west, &east] {
        for &(min, max, sen) in BANDS {
            weight_rules.push(WeightRule {
                zone_code: zone.code.clone(),
                rule_set_id: rule_set.id,
                weight_min: Decimal::from(min),
                weight_max: max.map(Decimal::from),
                price: Money::myr(Decimal::new(sen, 2)),
                service_type: ServiceType::Standard,
                is_active: true,
                effective_from: None,
                effective_to: None,
            });
        }
    }

    ZoneRateTable { zones: vec![west, east], rule_sets: vec![rule_set], weight_rules }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_shape() {
        let table = malaysia_default_table();
        assert_eq!(table.zones.len(), 2);
        assert_eq!(table.rule_sets.len(), 1);
        assert!(table.rule_sets[0].is_default);
        // five bands per zone, base prices identical across zones
        assert_eq!(table.weight_rules.len(), 10);
        let west: Vec<_> = table.weight_rules.iter().filter(|r| r.zone_code == "WEST").collect();
        let east: Vec<_> = table.weight_rules.iter().filter(|r| r.zone_code == "EAST").collect();
        for (w, e) in west.iter().zip(east.iter()) {
            assert_eq!(w.price, e.price);
        }
    }
}
