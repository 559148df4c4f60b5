//! Derived views over aggregated series: forecasting and monthly
//! mobility correlation. Everything here is pure and synchronous.

pub mod correlation;
pub mod forecast;

pub use correlation::{correlate, monthly_correlation};
pub use forecast::{forecast, moving_average, observed, summarize};
