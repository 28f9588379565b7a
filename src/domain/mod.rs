pub mod cart;
pub mod pricing;
pub mod shipping;
pub mod value_objects;
