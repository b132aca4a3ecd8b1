//! HTTP request handlers.

pub mod health;
pub mod orders;

pub use health::health_check;
pub use orders::{OrderListParams, get_order, list_orders, list_simple_orders};
