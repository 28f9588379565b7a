//! Cart Aggregation
//!
//! Folds a cart's lines through price resolution into a checkout-ready
//! summary: what the buyer owes, what a member would have paid, and how
//! far the buyer is from the membership-upgrade threshold.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::pricing::{BuyerContext, PricingProfile};
use crate::domain::value_objects::Money;

/// One cart line with its pricing snapshot, re-read from the catalog at
/// aggregation time (stale snapshots mis-price real orders).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    /// Always >= 1; a zero-quantity line is removed upstream.
    pub quantity: u32,
    pub pricing: PricingProfile,
}

/// Merchant policy inputs for aggregation. Independent of the shipping
/// policy's free-shipping threshold — the two serve different purposes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CartPolicy {
    pub membership_threshold: Money,
}

/// Checkout-ready totals. Every monetary field is rounded to 2 decimal
/// places independently at this boundary; intermediate sums are not
/// rounded. Tax and shipping are resolved by a later checkout step and
/// are always zero here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CartSummary {
    /// Total unit count across lines.
    pub item_count: u32,
    /// Full-price reference total (regular price, any buyer).
    pub subtotal: Money,
    /// Member-price reference total, shown as savings bait to guests.
    pub member_subtotal: Money,
    /// What this buyer actually owes before tax and shipping.
    pub applicable_subtotal: Money,
    /// `subtotal - member_subtotal`; negative when member pricing is
    /// misconfigured above regular, surfaced rather than clamped.
    pub potential_savings: Money,
    /// Resolved spend on membership-qualifying lines only.
    pub qualifying_total: Money,
    pub membership_threshold: Money,
    pub is_eligible_for_membership: bool,
    /// Progress toward the threshold, capped at 100, 1 decimal place.
    pub membership_progress_percent: Decimal,
    pub amount_needed_for_membership: Money,
    pub tax_amount: Money,
    pub shipping_cost: Money,
    pub total: Money,
}

/// Aggregate `lines` for `buyer` at `now`. Pure and infallible: an
/// empty cart yields an all-zero summary, never an error.
pub fn aggregate(
    lines: &[CartLine],
    buyer: &BuyerContext,
    policy: &CartPolicy,
    now: DateTime<Utc>,
) -> CartSummary {
    let currency = policy.membership_threshold.currency().to_string();
    let threshold = policy.membership_threshold.amount();

    if lines.is_empty() {
        let zero = Money::zero(&currency);
        return CartSummary {
            item_count: 0,
            subtotal: zero.clone(),
            member_subtotal: zero.clone(),
            applicable_subtotal: zero.clone(),
            potential_savings: zero.clone(),
            qualifying_total: zero.clone(),
            membership_threshold: policy.membership_threshold.clone().rounded(),
            is_eligible_for_membership: false,
            membership_progress_percent: Decimal::new(0, 1),
            amount_needed_for_membership: policy.membership_threshold.clone().rounded(),
            tax_amount: zero.clone(),
            shipping_cost: zero.clone(),
            total: zero,
        };
    }

    let mut item_count: u32 = 0;
    let mut subtotal = Decimal::ZERO;
    let mut member_subtotal = Decimal::ZERO;
    let mut applicable_subtotal = Decimal::ZERO;
    let mut qualifying_total = Decimal::ZERO;

    for line in lines {
        let qty = Decimal::from(line.quantity);
        let resolved = line.pricing.resolve(buyer, now);

        item_count += line.quantity;
        subtotal += line.pricing.regular_price.amount() * qty;
        member_subtotal += line.pricing.member_price.amount() * qty;
        applicable_subtotal += resolved.price.amount() * qty;
        if resolved.qualifies_for_membership_spend {
            qualifying_total += resolved.price.amount() * qty;
        }
    }

    let is_eligible = qualifying_total >= threshold;
    let progress = if threshold.is_zero() {
        Decimal::new(1000, 1) // 100.0
    } else {
        (qualifying_total / threshold * Decimal::ONE_HUNDRED)
            .min(Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    };
    let amount_needed = (threshold - qualifying_total).max(Decimal::ZERO);

    tracing::debug!(
        item_count,
        %applicable_subtotal,
        %qualifying_total,
        is_eligible,
        "cart aggregated"
    );

    let money = |amount: Decimal| Money::new(amount, &currency).rounded();
    CartSummary {
        item_count,
        subtotal: money(subtotal),
        member_subtotal: money(member_subtotal),
        applicable_subtotal: money(applicable_subtotal),
        potential_savings: money(subtotal - member_subtotal),
        qualifying_total: money(qualifying_total),
        membership_threshold: money(threshold),
        is_eligible_for_membership: is_eligible,
        membership_progress_percent: progress,
        amount_needed_for_membership: money(amount_needed),
        tax_amount: money(Decimal::ZERO),
        shipping_cost: money(Decimal::ZERO),
        total: money(applicable_subtotal),
    }
}
