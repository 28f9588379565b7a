//! Zone Rate Resolution
//!
//! Resolves a base shipping price from a zone/weight rate table: match
//! the destination to a zone, pick the applicable rule set, find the one
//! weight band covering the parcel, then scale the band's base price by
//! the zone multiplier. Every failure here is a configuration gap the
//! merchant must fix, never a transient fault.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::Money;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    #[default]
    Standard,
    Express,
    Economy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuyerType {
    #[default]
    Guest,
    Member,
}

/// Where the parcel is going. State codes are compared uppercase.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Destination {
    pub state: String,
    pub postcode: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShippingZone {
    pub code: String,
    pub name: String,
    /// Region codes served, stored uppercase.
    pub states: BTreeSet<String>,
    /// Postcode prefixes served; fallback when no state matches.
    pub postcode_prefixes: BTreeSet<String>,
    /// Scales band base prices; > 0. Remote zones carry > 1.
    pub multiplier: Decimal,
    pub delivery_days_min: u32,
    pub delivery_days_max: u32,
    pub is_active: bool,
}

impl ShippingZone {
    fn covers_state(&self, state: &str) -> bool {
        self.states.contains(&state.to_uppercase())
    }

    /// Longest matching prefix, if any.
    fn postcode_match_len(&self, postcode: &str) -> Option<usize> {
        self.postcode_prefixes
            .iter()
            .filter(|p| postcode.starts_with(p.as_str()))
            .map(|p| p.len())
            .max()
    }
}

/// Eligibility predicate on a rule set. All conditions on a rule set
/// must hold for it to apply.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleCondition {
    OrderValue { min: Option<Money>, max: Option<Money> },
    BuyerTypes { allowed: BTreeSet<BuyerType> },
    ServiceTypes { allowed: BTreeSet<ServiceType> },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleType {
    #[default]
    Standard,
    Seasonal,
    Promotional,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: Uuid,
    pub rule_type: RuleType,
    pub is_default: bool,
    pub is_active: bool,
    pub priority: i32,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub conditions: Vec<RuleCondition>,
}

impl RuleSet {
    fn active_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active { return false; }
        if let Some(from) = self.valid_from {
            if now < from { return false; }
        }
        if let Some(to) = self.valid_to {
            if now > to { return false; }
        }
        true
    }

    fn matches(&self, ctx: &RateContext, service: ServiceType) -> bool {
        self.conditions.iter().all(|c| match c {
            RuleCondition::OrderValue { min, max } => {
                let v = ctx.order_value.amount();
                min.as_ref().map_or(true, |m| v >= m.amount())
                    && max.as_ref().map_or(true, |m| v <= m.amount())
            }
            RuleCondition::BuyerTypes { allowed } => allowed.contains(&ctx.buyer_type),
            RuleCondition::ServiceTypes { allowed } => allowed.contains(&service),
        })
    }
}

/// One weight band of a `(zone, rule set, service type)` rate table.
/// Bands are half-open `[min, max)`; the final band leaves `max` unset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeightRule {
    pub zone_code: String,
    pub rule_set_id: Uuid,
    pub weight_min: Decimal,
    pub weight_max: Option<Decimal>,
    /// Base price; the zone multiplier is NOT pre-applied.
    pub price: Money,
    pub service_type: ServiceType,
    pub is_active: bool,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl WeightRule {
    fn effective_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active { return false; }
        if let Some(from) = self.effective_from {
            if now < from { return false; }
        }
        if let Some(to) = self.effective_to {
            if now > to { return false; }
        }
        true
    }

    fn contains(&self, weight: Decimal) -> bool {
        weight >= self.weight_min && self.weight_max.map_or(true, |max| weight < max)
    }
}

/// Order-side eligibility inputs for rule-set selection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateContext {
    pub buyer_type: BuyerType,
    pub order_value: Money,
}

/// Resolved base shipping rate, recomputed per request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneRate {
    pub price: Money,
    pub zone_code: String,
    pub rule_set_id: Uuid,
    pub delivery_days_min: u32,
    pub delivery_days_max: u32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    #[error("no shipping zone covers state {state} postcode {postcode}")]
    ZoneNotFound { state: String, postcode: String },
    #[error("no rate rule set applies to this order")]
    NoApplicableRuleSet,
    #[error("no weight band in zone {zone_code} covers {weight} kg")]
    NoMatchingWeightBand { zone_code: String, weight: Decimal },
}

/// The merchant's full zone/rate configuration, read fresh per lookup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ZoneRateTable {
    pub zones: Vec<ShippingZone>,
    pub rule_sets: Vec<RuleSet>,
    pub weight_rules: Vec<WeightRule>,
}

impl ZoneRateTable {
    /// Resolve the shipping price for a parcel of `weight` kg to
    /// `destination` at `now`. Fails fast on any configuration gap.
    pub fn resolve(
        &self,
        destination: &Destination,
        weight: Decimal,
        service: ServiceType,
        ctx: &RateContext,
        now: DateTime<Utc>,
    ) -> Result<ZoneRate, RateError> {
        let zone = self.match_zone(destination).ok_or_else(|| {
            tracing::warn!(state = %destination.state, postcode = %destination.postcode,
                "no shipping zone configured for destination");
            RateError::ZoneNotFound {
                state: destination.state.clone(),
                postcode: destination.postcode.clone(),
            }
        })?;

        let rule_set = self.select_rule_set(ctx, service, now).ok_or_else(|| {
            tracing::warn!(zone = %zone.code, ?service, "no applicable rate rule set");
            RateError::NoApplicableRuleSet
        })?;

        let band = self
            .weight_rules
            .iter()
            .find(|r| {
                r.zone_code == zone.code
                    && r.rule_set_id == rule_set.id
                    && r.service_type == service
                    && r.effective_at(now)
                    && r.contains(weight)
            })
            .ok_or_else(|| {
                tracing::warn!(zone = %zone.code, %weight, "weight band coverage gap");
                RateError::NoMatchingWeightBand { zone_code: zone.code.clone(), weight }
            })?;

        let price = band.price.scale(zone.multiplier).rounded();
        tracing::debug!(zone = %zone.code, rule_set = %rule_set.id, %weight,
            price = %price, "rate resolved");
        Ok(ZoneRate {
            price,
            zone_code: zone.code.clone(),
            rule_set_id: rule_set.id,
            delivery_days_min: zone.delivery_days_min,
            delivery_days_max: zone.delivery_days_max,
        })
    }

    /// State-code match wins over postcode-prefix match; among prefix
    /// matches the longest prefix wins, then zone code order.
    fn match_zone(&self, destination: &Destination) -> Option<&ShippingZone> {
        let active = || self.zones.iter().filter(|z| z.is_active);

        if let Some(zone) = active()
            .filter(|z| z.covers_state(&destination.state))
            .min_by(|a, b| a.code.cmp(&b.code))
        {
            return Some(zone);
        }

        active()
            .filter_map(|z| z.postcode_match_len(&destination.postcode).map(|len| (z, len)))
            .min_by(|(a, alen), (b, blen)| blen.cmp(alen).then(a.code.cmp(&b.code)))
            .map(|(zone, _)| zone)
    }

    /// Highest priority among rule sets active at `now` whose conditions
    /// all hold; ties broken by `is_default`, most recent `valid_from`
    /// (unset sorts oldest), then id.
    fn select_rule_set(
        &self,
        ctx: &RateContext,
        service: ServiceType,
        now: DateTime<Utc>,
    ) -> Option<&RuleSet> {
        self.rule_sets
            .iter()
            .filter(|r| r.active_at(now) && r.matches(ctx, service))
            .min_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then(b.is_default.cmp(&a.is_default))
                    .then(b.valid_from.cmp(&a.valid_from))
                    .then(a.id.cmp(&b.id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shipping::seed::malaysia_default_table;
    use chrono::Duration;

    fn ctx() -> RateContext {
        RateContext { buyer_type: BuyerType::Guest, order_value: Money::myr(Decimal::new(10000, 2)) }
    }

    fn west() -> Destination {
        Destination { state: "SGR".into(), postcode: "40000".into() }
    }

    fn east() -> Destination {
        Destination { state: "SBH".into(), postcode: "88000".into() }
    }

    #[test]
    fn test_standard_zone_band() {
        let table = malaysia_default_table();
        // 1.5 kg lands in the 1–2 kg band at its listed base price
        let rate = table
            .resolve(&west(), Decimal::new(15, 1), ServiceType::Standard, &ctx(), Utc::now())
            .unwrap();
        assert_eq!(rate.zone_code, "WEST");
        assert_eq!(rate.price.amount(), Decimal::new(1000, 2));
    }

    #[test]
    fn test_remote_zone_applies_multiplier() {
        let table = malaysia_default_table();
        let now = Utc::now();
        let weight = Decimal::new(15, 1);
        let west_rate = table.resolve(&west(), weight, ServiceType::Standard, &ctx(), now).unwrap();
        let east_rate = table.resolve(&east(), weight, ServiceType::Standard, &ctx(), now).unwrap();
        assert_eq!(east_rate.zone_code, "EAST");
        // same band base price scaled by 1.875: 10.00 -> 18.75
        assert_eq!(east_rate.price.amount(), Decimal::new(1875, 2));
        assert!(east_rate.price.amount() > west_rate.price.amount());
    }

    #[test]
    fn test_band_coverage_has_no_gaps_or_overlaps() {
        let table = malaysia_default_table();
        let now = Utc::now();
        let rule_set = table.rule_sets[0].id;
        // sweep [0, 999) in 0.25 kg steps; exactly one band matches each weight
        for zone in ["WEST", "EAST"] {
            let mut w = Decimal::ZERO;
            while w < Decimal::from(999) {
                let matches = table
                    .weight_rules
                    .iter()
                    .filter(|r| {
                        r.zone_code == zone
                            && r.rule_set_id == rule_set
                            && r.service_type == ServiceType::Standard
                            && r.effective_at(now)
                            && r.contains(w)
                    })
                    .count();
                assert_eq!(matches, 1, "weight {w} in zone {zone} matched {matches} bands");
                w += Decimal::new(25, 2);
            }
        }
    }

    #[test]
    fn test_band_boundaries_half_open() {
        let table = malaysia_default_table();
        let now = Utc::now();
        // exactly 1.0 kg belongs to the 1–2 band, not 0–1
        let at_one = table.resolve(&west(), Decimal::ONE, ServiceType::Standard, &ctx(), now).unwrap();
        assert_eq!(at_one.price.amount(), Decimal::new(1000, 2));
        // heaviest band is unbounded
        let heavy = table.resolve(&west(), Decimal::from(120), ServiceType::Standard, &ctx(), now).unwrap();
        assert_eq!(heavy.price.amount(), Decimal::new(2500, 2));
    }

    #[test]
    fn test_zone_not_found() {
        let table = malaysia_default_table();
        // Singapore: state unknown, postcode outside every configured prefix
        let dest = Destination { state: "SG".into(), postcode: "818956".into() };
        let err = table
            .resolve(&dest, Decimal::ONE, ServiceType::Standard, &ctx(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, RateError::ZoneNotFound { .. }));
    }

    #[test]
    fn test_postcode_fallback_and_state_precedence() {
        let mut table = malaysia_default_table();
        // destination with an unknown state but an East Malaysian postcode
        let dest = Destination { state: "".into(), postcode: "88300".into() };
        let rate = table.resolve(&dest, Decimal::ONE, ServiceType::Standard, &ctx(), Utc::now()).unwrap();
        assert_eq!(rate.zone_code, "EAST");

        // a state match beats a postcode match pointing elsewhere
        table.zones.iter_mut().find(|z| z.code == "WEST").unwrap().postcode_prefixes.insert("88".into());
        let rate = table.resolve(&east(), Decimal::ONE, ServiceType::Standard, &ctx(), Utc::now()).unwrap();
        assert_eq!(rate.zone_code, "EAST");
    }

    #[test]
    fn test_inactive_zone_skipped() {
        let mut table = malaysia_default_table();
        table.zones.iter_mut().find(|z| z.code == "EAST").unwrap().is_active = false;
        let err = table
            .resolve(&east(), Decimal::ONE, ServiceType::Standard, &ctx(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, RateError::ZoneNotFound { .. }));
    }

    #[test]
    fn test_rule_set_priority_and_tiebreaks() {
        let now = Utc::now();
        let mut table = malaysia_default_table();
        let base = table.rule_sets[0].clone();

        // higher priority wins even over the default
        let mut peak = base.clone();
        peak.id = Uuid::new_v4();
        peak.is_default = false;
        peak.priority = base.priority + 10;
        peak.rule_type = RuleType::Seasonal;
        table.rule_sets.push(peak.clone());
        assert_eq!(table.select_rule_set(&ctx(), ServiceType::Standard, now).unwrap().id, peak.id);

        // equal priority: default wins
        table.rule_sets.last_mut().unwrap().priority = base.priority;
        assert_eq!(table.select_rule_set(&ctx(), ServiceType::Standard, now).unwrap().id, base.id);

        // neither default: most recent valid_from wins
        let mut older = base.clone();
        older.id = Uuid::new_v4();
        older.is_default = false;
        older.valid_from = Some(now - Duration::days(30));
        let mut newer = older.clone();
        newer.id = Uuid::new_v4();
        newer.valid_from = Some(now - Duration::days(1));
        table.rule_sets = vec![older, newer.clone()];
        assert_eq!(table.select_rule_set(&ctx(), ServiceType::Standard, now).unwrap().id, newer.id);
    }

    #[test]
    fn test_rule_set_conditions() {
        let now = Utc::now();
        let mut table = malaysia_default_table();
        table.rule_sets[0].conditions = vec![
            RuleCondition::OrderValue { min: Some(Money::myr(Decimal::new(5000, 2))), max: None },
            RuleCondition::BuyerTypes { allowed: [BuyerType::Member].into_iter().collect() },
        ];

        // guest with a large order fails the buyer-type condition
        let err = table.resolve(&west(), Decimal::ONE, ServiceType::Standard, &ctx(), now).unwrap_err();
        assert_eq!(err, RateError::NoApplicableRuleSet);

        let member = RateContext { buyer_type: BuyerType::Member, order_value: Money::myr(Decimal::new(10000, 2)) };
        assert!(table.resolve(&west(), Decimal::ONE, ServiceType::Standard, &member, now).is_ok());

        // member below the order-value floor also fails
        let small = RateContext { buyer_type: BuyerType::Member, order_value: Money::myr(Decimal::new(1000, 2)) };
        let err = table.resolve(&west(), Decimal::ONE, ServiceType::Standard, &small, now).unwrap_err();
        assert_eq!(err, RateError::NoApplicableRuleSet);
    }

    #[test]
    fn test_expired_rule_set() {
        let now = Utc::now();
        let mut table = malaysia_default_table();
        table.rule_sets[0].valid_to = Some(now - Duration::days(1));
        let err = table.resolve(&west(), Decimal::ONE, ServiceType::Standard, &ctx(), now).unwrap_err();
        assert_eq!(err, RateError::NoApplicableRuleSet);
    }

    #[test]
    fn test_missing_service_band() {
        let table = malaysia_default_table();
        // seeded table carries Standard bands only
        let err = table
            .resolve(&west(), Decimal::ONE, ServiceType::Express, &ctx(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, RateError::NoMatchingWeightBand { .. }));
    }

    #[test]
    fn test_weight_rule_effective_window() {
        let now = Utc::now();
        let mut table = malaysia_default_table();
        for rule in &mut table.weight_rules {
            rule.effective_to = Some(now - Duration::days(1));
        }
        let err = table.resolve(&west(), Decimal::ONE, ServiceType::Standard, &ctx(), now).unwrap_err();
        assert!(matches!(err, RateError::NoMatchingWeightBand { .. }));
    }
}
