//! ARIMA (Autoregressive Integrated Moving Average) models.

mod diff;
mod model;

pub use diff::{difference, integrate};
pub use model::{ARIMASpec, ARIMA};
