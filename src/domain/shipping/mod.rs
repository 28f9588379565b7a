//! Shipping: zone rate tables and courier selection.

pub mod courier;
pub mod seed;
pub mod zones;
