//! Core data structures for daily series forecasting.

mod daily_series;
mod forecast;

pub use daily_series::DailySeries;
pub use forecast::Forecast;
