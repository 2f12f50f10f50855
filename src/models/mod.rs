//! Forecasting models.

mod traits;

pub mod arima;

pub use arima::{ARIMASpec, ARIMA};
pub use traits::Forecaster;
