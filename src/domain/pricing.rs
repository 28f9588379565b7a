//! Price Resolution
//!
//! Resolves the unit price a specific buyer pays for a product at a
//! specific moment: an active promotion wins over member pricing, which
//! wins over the regular shelf price. Promotional purchases never count
//! toward the membership-upgrade threshold — the discount itself is the
//! incentive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Money;

/// Pricing attributes of one product, read fresh from the catalog
/// before every resolution. Merchant-managed; never mutated here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PricingProfile {
    pub regular_price: Money,
    pub member_price: Money,
    pub is_promotional: bool,
    pub promotional_price: Option<Money>,
    pub promotion_start: Option<DateTime<Utc>>,
    pub promotion_end: Option<DateTime<Utc>>,
    /// Does spend on this product count toward the membership threshold?
    pub qualifies_for_membership: bool,
    /// Restricted to members before this instant (catalog gate only).
    pub member_only_until: Option<DateTime<Utc>>,
    /// Members may buy before this public release instant (catalog gate only).
    pub early_access_start: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct BuyerContext {
    pub is_member: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    #[default]
    Regular,
    Member,
    Promotional,
}

/// Ephemeral output of one resolution; recomputed per request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceResolution {
    pub price: Money,
    pub price_type: PriceType,
    pub qualifies_for_membership_spend: bool,
}

impl PricingProfile {
    /// A promotion is active when the flag is set, a promotional price
    /// exists, and `now` falls within the inclusive window. An unset
    /// bound is unbounded on that side.
    pub fn promotion_active_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_promotional || self.promotional_price.is_none() {
            return false;
        }
        if let Some(start) = self.promotion_start {
            if now < start { return false; }
        }
        if let Some(end) = self.promotion_end {
            if now > end { return false; }
        }
        true
    }

    /// Resolve the effective unit price for `buyer` at `now`.
    /// Pure and total: first matching rule wins.
    pub fn resolve(&self, buyer: &BuyerContext, now: DateTime<Utc>) -> PriceResolution {
        if self.promotion_active_at(now) {
            // promotion_active_at guarantees the price is present
            let price = self.promotional_price.clone().unwrap_or_else(|| self.regular_price.clone());
            return PriceResolution {
                price,
                price_type: PriceType::Promotional,
                qualifies_for_membership_spend: false,
            };
        }
        if buyer.is_member {
            return PriceResolution {
                price: self.member_price.clone(),
                price_type: PriceType::Member,
                qualifies_for_membership_spend: self.qualifies_for_membership,
            };
        }
        PriceResolution {
            price: self.regular_price.clone(),
            price_type: PriceType::Regular,
            qualifies_for_membership_spend: self.qualifies_for_membership,
        }
    }

    /// Catalog-availability gate over the member-only and early-access
    /// windows. Does not influence `resolve` — a product a buyer cannot
    /// see still prices the same.
    pub fn purchasable_by(&self, buyer: &BuyerContext, now: DateTime<Utc>) -> bool {
        if buyer.is_member {
            return true;
        }
        if let Some(until) = self.member_only_until {
            if now < until { return false; }
        }
        if let Some(release) = self.early_access_start {
            if now < release { return false; }
        }
        true
    }
}
