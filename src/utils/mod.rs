//! Numerical helpers shared by the forecasting models.

pub mod ols;
pub mod optimization;
pub mod stats;

pub use ols::{lagged_least_squares, LaggedFit};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{gaussian_log_likelihood, is_invertible, is_stationary};
