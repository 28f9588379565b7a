//! Kedai Checkout — Order Economics Engine
//!
//! Pricing and shipping arithmetic for a Malaysian storefront.
//!
//! ## Features
//! - Effective-price resolution (promotional, member, regular)
//! - Cart aggregation with membership-threshold progress
//! - Zone/weight shipping rate tables with multiplier scaling
//! - Courier selection over live rate quotes under merchant policy
//! - Concurrent rate-quote collection with per-carrier timeouts
//!
//! Every component is a pure computation over caller-supplied values:
//! no I/O, no shared state, no clock reads. The surrounding storefront
//! reads configuration fresh before each call and owns persistence,
//! checkout presentation, and the free-shipping waiver.

pub mod domain;
pub mod rates;

pub use domain::cart::{aggregate, CartLine, CartPolicy, CartSummary};
pub use domain::pricing::{BuyerContext, PriceResolution, PriceType, PricingProfile};
pub use domain::shipping::courier::{
    select, CourierPreference, CourierSelection, Dimensions, QuoteAnalytics, RateQuote,
    SelectionCriteria, SelectionError, ShippingPolicy,
};
pub use domain::shipping::seed::malaysia_default_table;
pub use domain::shipping::zones::{
    BuyerType, Destination, RateContext, RateError, RuleCondition, RuleSet, RuleType, ServiceType,
    ShippingZone, WeightRule, ZoneRate, ZoneRateTable,
};
pub use domain::value_objects::{Money, MoneyError};
pub use rates::{gather_quotes, QuoteSource};
