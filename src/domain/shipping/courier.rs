//! Courier Selection
//!
//! Picks one carrier quote out of a set of live rate offers under the
//! merchant's shipping policy: filter out ineligible couriers, rank the
//! rest deterministically, and report the pick with a human-readable
//! justification plus comparative savings. The free-shipping waiver is
//! deliberately not applied here — the selector always returns the real
//! quote and leaves the zero-cost display line to the caller.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::domain::shipping::zones::ServiceType;
use crate::domain::value_objects::Money;

/// Merchant-configured ranking/restriction for one carrier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CourierPreference {
    pub courier_id: String,
    pub priority: i32,
    pub enabled: bool,
    pub service_types: BTreeSet<ServiceType>,
    pub max_weight: Option<Decimal>,
    /// Zone codes this courier is allowed to serve; `None` means all.
    pub coverage_areas: Option<BTreeSet<String>>,
}

/// A carrier's live offer for this parcel, fetched out-of-band.
/// Capability flags arrive with the quote from the rate marketplace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub courier_id: String,
    pub courier_name: String,
    pub price: Money,
    pub service_type: ServiceType,
    pub estimated_days: u32,
    pub cod_supported: bool,
    pub insurance_available: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
}

impl Dimensions {
    pub fn fits_within(&self, limit: &Dimensions) -> bool {
        self.length <= limit.length && self.width <= limit.width && self.height <= limit.height
    }
}

/// Merchant shipping configuration, read fresh per selection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub auto_select_cheapest: bool,
    /// Display concern for the caller; the selector ignores it.
    pub show_customer_choice: bool,
    /// Courier ids in preference order; earlier is better.
    pub preferred_couriers: Vec<String>,
    pub blocked_couriers: BTreeSet<String>,
    pub default_service_type: ServiceType,
    pub free_shipping_threshold: Money,
    pub max_weight: Option<Decimal>,
    pub max_dimensions: Option<Dimensions>,
    pub insurance_required: bool,
    pub max_insurance_value: Money,
    pub cod_enabled: bool,
    pub max_cod_amount: Money,
    pub signature_required: bool,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            auto_select_cheapest: true,
            show_customer_choice: true,
            preferred_couriers: Vec::new(),
            blocked_couriers: BTreeSet::new(),
            default_service_type: ServiceType::Standard,
            free_shipping_threshold: Money::myr(Decimal::new(15000, 2)),
            max_weight: Some(Decimal::from(30)),
            max_dimensions: None,
            insurance_required: false,
            max_insurance_value: Money::myr(Decimal::new(100000, 2)),
            cod_enabled: true,
            max_cod_amount: Money::myr(Decimal::new(50000, 2)),
            signature_required: false,
        }
    }
}

impl ShippingPolicy {
    /// Free-shipping waiver check for the caller; the selector itself
    /// never substitutes a zero-cost line.
    pub fn grants_free_shipping(&self, order_value: &Money) -> bool {
        order_value.amount() >= self.free_shipping_threshold.amount()
    }
}

/// Parcel/order facts the filter needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionCriteria {
    pub zone_code: String,
    pub weight: Decimal,
    pub dimensions: Option<Dimensions>,
    pub order_value: Money,
    pub cod_required: bool,
}

/// Rollup over the eligible set for downstream analytics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteAnalytics {
    pub quote_count: usize,
    pub average_price: Money,
    pub price_spread: Money,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CourierSelection {
    pub selected: RateQuote,
    pub reason: String,
    pub savings_vs_most_expensive: Money,
    /// Full eligible set in rank order, best first.
    pub ranked: Vec<RateQuote>,
    pub analytics: QuoteAnalytics,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no courier quote satisfies the shipping policy")]
    NoEligibleQuote,
}

/// Select one quote under `policy` and `preferences`.
pub fn select(
    quotes: &[RateQuote],
    preferences: &[CourierPreference],
    policy: &ShippingPolicy,
    criteria: &SelectionCriteria,
) -> Result<CourierSelection, SelectionError> {
    let mut eligible: Vec<RateQuote> = quotes
        .iter()
        .filter(|q| match drop_reason(q, preferences, policy, criteria) {
            Some(reason) => {
                tracing::debug!(courier = %q.courier_id, reason, "quote filtered out");
                false
            }
            None => true,
        })
        .cloned()
        .collect();

    if eligible.is_empty() {
        tracing::warn!(zone = %criteria.zone_code, weight = %criteria.weight,
            "no eligible courier quote");
        return Err(SelectionError::NoEligibleQuote);
    }

    eligible.sort_by(|a, b| rank(a, b, policy));

    let selected = eligible[0].clone();
    let most_expensive = eligible
        .iter()
        .map(|q| q.price.amount())
        .max()
        .unwrap_or_else(|| selected.price.amount());
    let currency = selected.price.currency().to_string();
    let savings = Money::new(most_expensive - selected.price.amount(), &currency).rounded();

    let sum: Decimal = eligible.iter().map(|q| q.price.amount()).sum();
    let min = eligible.iter().map(|q| q.price.amount()).min().unwrap_or(Decimal::ZERO);
    let analytics = QuoteAnalytics {
        quote_count: eligible.len(),
        average_price: Money::new(sum / Decimal::from(eligible.len() as u64), &currency).rounded(),
        price_spread: Money::new(most_expensive - min, &currency).rounded(),
    };

    let preferred = policy.preferred_couriers.contains(&selected.courier_id);
    let reason = if policy.auto_select_cheapest {
        "cheapest eligible rate".to_string()
    } else if preferred {
        "preferred courier".to_string()
    } else {
        "lowest price among eligible couriers".to_string()
    };

    tracing::debug!(courier = %selected.courier_id, price = %selected.price,
        %reason, eligible = eligible.len(), "courier selected");

    Ok(CourierSelection { selected, reason, savings_vs_most_expensive: savings, ranked: eligible, analytics })
}

/// Why a quote is ineligible, or `None` if it passes every gate.
fn drop_reason(
    quote: &RateQuote,
    preferences: &[CourierPreference],
    policy: &ShippingPolicy,
    criteria: &SelectionCriteria,
) -> Option<&'static str> {
    if policy.blocked_couriers.contains(&quote.courier_id) {
        return Some("courier blocked");
    }

    match preferences.iter().find(|p| p.courier_id == quote.courier_id) {
        Some(pref) => {
            if !pref.enabled {
                return Some("courier disabled");
            }
            if !pref.service_types.contains(&quote.service_type) {
                return Some("service type not offered for courier");
            }
            if pref.max_weight.is_some_and(|max| criteria.weight > max) {
                return Some("parcel over courier weight limit");
            }
            if let Some(areas) = &pref.coverage_areas {
                if !areas.contains(&criteria.zone_code) {
                    return Some("destination outside courier coverage");
                }
            }
        }
        None => {
            if quote.service_type != policy.default_service_type {
                return Some("not the default service type");
            }
        }
    }

    if policy.max_weight.is_some_and(|max| criteria.weight > max) {
        return Some("parcel over policy weight limit");
    }
    if let (Some(dims), Some(limit)) = (&criteria.dimensions, &policy.max_dimensions) {
        if !dims.fits_within(limit) {
            return Some("parcel over policy dimension limit");
        }
    }

    if criteria.cod_required {
        if !policy.cod_enabled || !quote.cod_supported {
            return Some("cash on delivery unavailable");
        }
        if criteria.order_value.amount() > policy.max_cod_amount.amount() {
            return Some("order value over COD limit");
        }
    }

    if policy.insurance_required
        && criteria.order_value.amount() > policy.max_insurance_value.amount()
        && !quote.insurance_available
    {
        return Some("insurance unavailable");
    }

    None
}

/// Deterministic rank order, best first. Courier name is the final
/// tie-break so equal offers always resolve the same way.
fn rank(a: &RateQuote, b: &RateQuote, policy: &ShippingPolicy) -> Ordering {
    let pref_index = |q: &RateQuote| {
        policy
            .preferred_couriers
            .iter()
            .position(|c| *c == q.courier_id)
            .unwrap_or(usize::MAX)
    };
    let by_price = a.price.amount().cmp(&b.price.amount());
    let by_pref = pref_index(a).cmp(&pref_index(b));
    let by_days = a.estimated_days.cmp(&b.estimated_days);
    let by_name = a.courier_name.cmp(&b.courier_name);

    if policy.auto_select_cheapest {
        by_price.then(by_pref).then(by_days).then(by_name)
    } else {
        by_pref.then(by_price).then(by_days).then(by_name)
    }
}
