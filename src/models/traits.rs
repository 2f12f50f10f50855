//! Forecaster trait defining the common interface for daily models.

use crate::core::{DailySeries, Forecast};
use crate::error::Result;

/// Common interface for forecasting models fitted to a [`DailySeries`].
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the series.
    fn fit(&mut self, series: &DailySeries) -> Result<()>;

    /// Predict the `horizon` calendar days following the fitted series.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}
