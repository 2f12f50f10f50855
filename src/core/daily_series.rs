//! Calendar-day indexed series.

use crate::error::{ForecastError, Result};
use chrono::{Days, NaiveDate};

fn is_missing(v: f64) -> bool {
    v.is_nan() || v.is_infinite()
}

/// A series with one value per calendar day.
///
/// Dates are strictly increasing but need not be contiguous until
/// [`DailySeries::as_daily_frequency`] has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl DailySeries {
    /// Create a series from aligned dates and values.
    ///
    /// Dates must be strictly increasing.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: dates.len(),
                got: values.len(),
            });
        }

        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ForecastError::TimestampError(
                "dates must be strictly increasing".to_string(),
            ));
        }

        Ok(Self { dates, values })
    }

    /// Create a series from observations in any order.
    ///
    /// Observations are sorted by date; a repeated date is an error.
    pub fn from_observations(mut observations: Vec<(NaiveDate, f64)>) -> Result<Self> {
        observations.sort_by_key(|(date, _)| *date);
        let (dates, values) = observations.into_iter().unzip();
        Self::new(dates, values)
    }

    /// An empty series.
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Iterate over `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Value observed on `date`, if any.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// The last `n` observations (the whole series if shorter).
    pub fn tail(&self, n: usize) -> DailySeries {
        let start = self.len().saturating_sub(n);
        DailySeries {
            dates: self.dates[start..].to_vec(),
            values: self.values[start..].to_vec(),
        }
    }

    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|&v| is_missing(v))
    }

    /// Check that no calendar day between the first and last date is absent.
    pub fn is_contiguous(&self) -> bool {
        self.dates
            .windows(2)
            .all(|w| w[0].checked_add_days(Days::new(1)) == Some(w[1]))
    }

    /// Reindex onto every calendar day between the first and last date.
    ///
    /// Days absent from the series are inserted with `NaN`. A gap-free series
    /// is returned unchanged.
    pub fn as_daily_frequency(&self) -> DailySeries {
        let (Some(first), Some(last)) = (self.first_date(), self.last_date()) else {
            return DailySeries::empty();
        };

        let span = (last - first).num_days() as usize + 1;
        let mut dates = Vec::with_capacity(span);
        let mut values = Vec::with_capacity(span);
        let mut observed = self.iter().peekable();

        for date in first.iter_days().take(span) {
            dates.push(date);
            match observed.peek() {
                Some(&(d, v)) if d == date => {
                    values.push(v);
                    observed.next();
                }
                _ => values.push(f64::NAN),
            }
        }

        DailySeries { dates, values }
    }

    /// Replace each missing value with the last valid value before it.
    ///
    /// A leading gap has nothing to carry and stays missing.
    pub fn forward_filled(&self) -> DailySeries {
        let mut last_valid = None;
        let values = self
            .values
            .iter()
            .map(|&v| {
                if is_missing(v) {
                    last_valid.unwrap_or(v)
                } else {
                    last_valid = Some(v);
                    v
                }
            })
            .collect();
        DailySeries {
            dates: self.dates.clone(),
            values,
        }
    }

    /// The `horizon` consecutive calendar days after the last observed date.
    pub fn future_dates(&self, horizon: usize) -> Result<Vec<NaiveDate>> {
        let last = self.last_date().ok_or(ForecastError::EmptyData)?;
        let dates: Vec<NaiveDate> = last.iter_days().skip(1).take(horizon).collect();
        if dates.len() != horizon {
            return Err(ForecastError::TimestampError(
                "forecast dates overflow the calendar".to_string(),
            ));
        }
        Ok(dates)
    }
}
