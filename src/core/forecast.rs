//! Forecast result structure for holding dated point predictions.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;

/// A point forecast indexed by calendar day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    dates: Vec<NaiveDate>,
    point: Vec<f64>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from aligned dates and point predictions.
    pub fn from_values(dates: Vec<NaiveDate>, point: Vec<f64>) -> Result<Self> {
        if dates.len() != point.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: dates.len(),
                got: point.len(),
            });
        }
        Ok(Self { dates, point })
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Forecast dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Point predictions, aligned with [`Forecast::dates`].
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// Iterate over `(date, value)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.point.iter().copied())
    }

    /// Check that every prediction is finite.
    pub fn is_finite(&self) -> bool {
        self.point.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .iter_days()
            .take(n)
            .collect()
    }

    #[test]
    fn forecast_empty_state() {
        let forecast = Forecast::new();
        assert!(forecast.is_empty());
        assert_eq!(forecast.horizon(), 0);
        assert_eq!(forecast.rows().count(), 0);
    }

    #[test]
    fn forecast_from_values_aligns_rows() {
        let forecast = Forecast::from_values(dates(3), vec![1.0, 2.0, 3.0]).unwrap();

        assert!(!forecast.is_empty());
        assert_eq!(forecast.horizon(), 3);
        assert_eq!(forecast.point(), &[1.0, 2.0, 3.0]);

        let rows: Vec<_> = forecast.rows().collect();
        assert_eq!(rows[2], (dates(3)[2], 3.0));
    }

    #[test]
    fn forecast_rejects_misaligned_dates() {
        assert!(matches!(
            Forecast::from_values(dates(2), vec![1.0, 2.0, 3.0]),
            Err(ForecastError::DimensionMismatch {
                expected: 2,
                got: 3
            })
        ));
    }

    #[test]
    fn forecast_reports_non_finite_values() {
        let forecast = Forecast::from_values(dates(2), vec![1.0, f64::NAN]).unwrap();
        assert!(!forecast.is_finite());
    }
}
