//! ARIMA (Autoregressive Integrated Moving Average) model.

use crate::core::{DailySeries, Forecast};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, integrate};
use crate::models::Forecaster;
use crate::utils::ols::lagged_least_squares;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{gaussian_log_likelihood, is_invertible, is_stationary, mean};
use tracing::debug;

/// ARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
    /// Whether a mean is estimated for the differenced series.
    pub include_constant: bool,
}

impl ARIMASpec {
    /// Create a new ARIMA specification.
    ///
    /// A constant is estimated only for undifferenced models (`d == 0`).
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            include_constant: d == 0,
        }
    }

    /// Override whether a constant is estimated.
    pub fn with_constant(mut self, include_constant: bool) -> Self {
        self.include_constant = include_constant;
        self
    }

    /// Number of estimated mean-equation coefficients.
    pub fn num_params(&self) -> usize {
        self.p + self.q + usize::from(self.include_constant)
    }

    /// Shortest series the model can be fitted to.
    pub fn min_observations(&self) -> usize {
        self.d + self.p.max(self.q) + self.num_params() + 1
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(5, 1, 0)
    }
}

impl std::fmt::Display for ARIMASpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA forecasting model.
///
/// ARIMA(p, d, q) combines:
/// - AR(p): Autoregressive component
/// - I(d): Differencing for stationarity
/// - MA(q): Moving average component
///
/// Coefficients are estimated by conditional Gaussian maximum likelihood:
/// the concentrated negative log-likelihood `n/2 * ln(css / n)` is minimized
/// over stationary AR and invertible MA polynomials, starting from the
/// least-squares AR fit. This conditions on the first `p` differenced
/// observations instead of evaluating the exact state-space likelihood, so
/// estimates and forecasts differ numerically from exact-MLE fitters such as
/// statsmodels, most visibly on short series.
#[derive(Debug, Clone)]
pub struct ARIMA {
    spec: ARIMASpec,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    /// Mean of the differenced series (0 without a constant).
    mean: f64,
    /// Fitted series on the original scale.
    history: Option<DailySeries>,
    /// Differenced series.
    differenced: Option<Vec<f64>>,
    /// Fitted values on differenced scale.
    fitted_diff: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    log_likelihood: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
    converged: bool,
    iterations: usize,
}

impl ARIMA {
    /// Create a new ARIMA model.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::from_spec(ARIMASpec::new(p, d, q))
    }

    /// Create a model from a full specification.
    pub fn from_spec(spec: ARIMASpec) -> Self {
        Self {
            spec,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            mean: 0.0,
            history: None,
            differenced: None,
            fitted_diff: None,
            residuals: None,
            residual_variance: None,
            log_likelihood: None,
            aic: None,
            bic: None,
            converged: false,
            iterations: 0,
        }
    }

    /// Get the model specification.
    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    /// Get AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Get MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Mean of the differenced series.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Innovation variance estimate.
    pub fn residual_variance(&self) -> Option<f64> {
        self.residual_variance
    }

    /// Conditional log-likelihood at the estimate.
    pub fn log_likelihood(&self) -> Option<f64> {
        self.log_likelihood
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Whether the likelihood search met its tolerance.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Optimizer iterations spent in the last fit.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Residuals and conditional sum of squares for given parameters.
    ///
    /// The first `p` observations are conditioned on; pre-sample MA
    /// residuals are zero.
    fn conditional_residuals(
        diff_series: &[f64],
        ar: &[f64],
        ma: &[f64],
        mean: f64,
    ) -> (Vec<f64>, f64) {
        let n = diff_series.len();
        let start = ar.len();
        let mut residuals = vec![0.0; n];
        let mut css = 0.0;

        for t in start..n {
            let mut pred = mean;

            for (i, a) in ar.iter().enumerate() {
                pred += a * (diff_series[t - 1 - i] - mean);
            }

            for (i, b) in ma.iter().enumerate() {
                if t > i {
                    pred += b * residuals[t - 1 - i];
                }
            }

            let error = diff_series[t] - pred;
            residuals[t] = error;
            css += error * error;
        }

        (residuals, css)
    }

    /// Split a flat parameter vector into (mean, ar, ma).
    fn unpack<'a>(&self, params: &'a [f64]) -> (f64, &'a [f64], &'a [f64]) {
        let offset = usize::from(self.spec.include_constant);
        let mean = if self.spec.include_constant {
            params[0]
        } else {
            0.0
        };
        let ar = &params[offset..offset + self.spec.p];
        let ma = &params[offset + self.spec.p..];
        (mean, ar, ma)
    }

    /// Least-squares starting point, shrunk until stationary.
    fn initial_parameters(&self, diff_series: &[f64]) -> Vec<f64> {
        let p = self.spec.p;
        let q = self.spec.q;

        // A singular lag matrix (e.g. a constant differenced series) leaves
        // the search to start from zero.
        let mut ar = match lagged_least_squares(diff_series, p, self.spec.include_constant) {
            Ok(fit) => fit.coefficients,
            Err(err) => {
                debug!(%err, "least-squares start failed; starting AR search at zero");
                vec![0.0; p]
            }
        };
        let mut attempts = 0;
        while !is_stationary(&ar) && attempts < 50 {
            ar.iter_mut().for_each(|a| *a *= 0.9);
            attempts += 1;
        }
        if !is_stationary(&ar) {
            ar = vec![0.0; p];
        }

        let mut initial = Vec::with_capacity(self.spec.num_params());
        if self.spec.include_constant {
            initial.push(mean(diff_series));
        }
        initial.extend(ar);
        initial.extend((0..q).map(|i| 0.1 / (i + 1) as f64));
        initial
    }

    fn estimate_parameters(&mut self, diff_series: &[f64]) -> Result<()> {
        let n_eff = (diff_series.len() - self.spec.p) as f64;

        if self.spec.num_params() == 0 {
            self.mean = 0.0;
            self.ar_coefficients = vec![];
            self.ma_coefficients = vec![];
            self.converged = true;
            self.iterations = 0;
            return Ok(());
        }

        let initial = self.initial_parameters(diff_series);

        let config = NelderMeadConfig {
            max_iter: 2000,
            tolerance: 1e-10,
            ..Default::default()
        };

        let result = nelder_mead(
            |params| {
                let (mean, ar, ma) = self.unpack(params);
                if !is_stationary(ar) || !is_invertible(ma) {
                    return f64::INFINITY;
                }
                let (_, css) = Self::conditional_residuals(diff_series, ar, ma, mean);
                0.5 * n_eff * (css / n_eff).max(f64::MIN_POSITIVE).ln()
            },
            &initial,
            config,
        );

        if !result.optimal_value.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "{} likelihood search found no admissible parameters",
                self.spec
            )));
        }

        let (mean, ar, ma) = self.unpack(&result.optimal_point);
        self.mean = mean;
        self.ar_coefficients = ar.to_vec();
        self.ma_coefficients = ma.to_vec();
        self.converged = result.converged;
        self.iterations = result.iterations;
        Ok(())
    }

    /// Calculate fitted values, residuals and information criteria.
    fn calculate_fitted(&mut self, diff_series: &[f64]) {
        let start = self.spec.p;
        let (residuals, css) = Self::conditional_residuals(
            diff_series,
            &self.ar_coefficients,
            &self.ma_coefficients,
            self.mean,
        );

        let fitted: Vec<f64> = diff_series
            .iter()
            .zip(&residuals)
            .enumerate()
            .map(|(t, (y, e))| if t < start { f64::NAN } else { y - e })
            .collect();

        let n_eff = (diff_series.len() - start) as f64;
        let variance = css / n_eff;
        self.residual_variance = Some(variance);
        self.log_likelihood = gaussian_log_likelihood(&residuals[start..], variance);

        // Innovation variance counts as an estimated parameter.
        let k = (self.spec.num_params() + 1) as f64;
        self.aic = self.log_likelihood.map(|ll| -2.0 * ll + 2.0 * k);
        self.bic = self.log_likelihood.map(|ll| -2.0 * ll + k * n_eff.ln());

        self.fitted_diff = Some(fitted);
        self.residuals = Some(residuals);
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::from_spec(ARIMASpec::default())
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &DailySeries) -> Result<()> {
        if series.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }

        let values = series.values();
        let min_len = self.spec.min_observations();
        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        let diff_series = difference(values, self.spec.d);

        self.estimate_parameters(&diff_series)?;
        self.calculate_fitted(&diff_series);

        self.differenced = Some(diff_series);
        self.history = Some(series.clone());

        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let history = self.history.as_ref().ok_or(ForecastError::FitRequired)?;
        let diff_series = self
            .differenced
            .as_ref()
            .ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let mut extended_diff = diff_series.clone();
        let mut extended_residuals = residuals.clone();

        for _ in 0..horizon {
            let t = extended_diff.len();
            let mut pred = self.mean;

            for (i, a) in self.ar_coefficients.iter().enumerate() {
                if t > i {
                    pred += a * (extended_diff[t - 1 - i] - self.mean);
                }
            }

            // Future residuals are 0
            for (i, b) in self.ma_coefficients.iter().enumerate() {
                if t > i {
                    pred += b * extended_residuals[t - 1 - i];
                }
            }

            extended_diff.push(pred);
            extended_residuals.push(0.0);
        }

        let forecast_diff = &extended_diff[diff_series.len()..];
        let predictions = integrate(forecast_diff, history.values(), self.spec.d);

        Forecast::from_values(history.future_dates(horizon)?, predictions)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted_diff.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn make_series(values: Vec<f64>) -> DailySeries {
        let dates = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .iter_days()
            .take(values.len())
            .collect();
        DailySeries::new(dates, values).unwrap()
    }

    fn noise(n: usize, seed: u64, scale: f64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-scale..scale)).collect()
    }

    #[test]
    fn arima_510_trend_forecast_is_finite() {
        let e = noise(100, 42, 5.0);
        let values: Vec<f64> = (0..100).map(|i| 1000.0 + 12.0 * i as f64 + e[i]).collect();
        let ts = make_series(values);

        let mut model = ARIMA::new(5, 1, 0);
        model.fit(&ts).unwrap();

        assert_eq!(model.ar_coefficients().len(), 5);
        assert!(model.ma_coefficients().is_empty());
        assert!(is_stationary(model.ar_coefficients()));

        let forecast = model.predict(30).unwrap();
        assert_eq!(forecast.horizon(), 30);
        assert!(forecast.is_finite());
        assert_eq!(
            forecast.dates()[0],
            NaiveDate::from_ymd_opt(2024, 4, 10).unwrap()
        );
    }

    #[test]
    fn arima_ar1_recovers_coefficient() {
        let e = noise(400, 3, 1.0);
        let mut values = vec![0.0];
        for t in 1..400 {
            values.push(0.7 * values[t - 1] + e[t]);
        }
        let ts = make_series(values);

        let mut model = ARIMA::new(1, 0, 0);
        model.fit(&ts).unwrap();

        assert!((model.ar_coefficients()[0] - 0.7).abs() < 0.15);
        assert!(model.mean().abs() < 0.5);
    }

    #[test]
    fn large_exact_trend_fits_without_least_squares_start() {
        // Constant differences make the lag matrix singular.
        let values: Vec<f64> = (0..100).map(|i| 8_000_000.0 + 12_345.0 * i as f64).collect();
        let last = *values.last().unwrap();
        let ts = make_series(values);

        let mut model = ARIMA::new(5, 1, 0);
        model.fit(&ts).unwrap();
        assert!(is_stationary(model.ar_coefficients()));

        let forecast = model.predict(30).unwrap();
        let preds = forecast.point();
        assert!(forecast.is_finite());
        assert!(preds[0] > last);
        assert!(preds[29] > preds[0]);
    }

    #[test]
    fn arima_ma1_fits_and_forecasts() {
        let values: Vec<f64> = (0..100).map(|i| 10.0 + (i as f64 * 0.2).sin()).collect();
        let ts = make_series(values);

        let mut model = ARIMA::new(0, 0, 1);
        model.fit(&ts).unwrap();
        assert!(is_invertible(model.ma_coefficients()));

        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.horizon(), 5);
        assert!(forecast.is_finite());
    }

    #[test]
    fn differenced_model_continues_linear_trend() {
        // Differences of an exact line are constant; the AR(1) estimate
        // approaches the unit-root boundary and keeps the increment.
        let values: Vec<f64> = (0..50).map(|i| 10.0 + 2.0 * i as f64).collect();
        let last = *values.last().unwrap();
        let ts = make_series(values);

        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&ts).unwrap();

        let forecast = model.predict(5).unwrap();
        let preds = forecast.point();
        assert!(preds[0] > last);
        assert!(preds[4] > preds[0]);
        assert!(forecast.is_finite());
    }

    #[test]
    fn information_criteria_are_reported() {
        let e = noise(80, 9, 1.0);
        let values: Vec<f64> = (0..80)
            .map(|i| 10.0 + (i as f64 * 0.3).sin() + e[i])
            .collect();
        let ts = make_series(values);

        let mut model = ARIMA::new(1, 0, 1);
        model.fit(&ts).unwrap();

        let ll = model.log_likelihood().unwrap();
        let aic = model.aic().unwrap();
        let bic = model.bic().unwrap();
        assert_relative_eq!(aic, -2.0 * ll + 2.0 * 4.0, epsilon = 1e-9);
        assert!(bic > aic);
        assert!(model.residual_variance().unwrap() > 0.0);
    }

    #[test]
    fn arima_insufficient_data() {
        let ts = make_series(vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let mut model = ARIMA::new(5, 1, 0);
        assert!(matches!(
            model.fit(&ts),
            Err(ForecastError::InsufficientData { needed: 12, got: 5 })
        ));
    }

    #[test]
    fn arima_rejects_non_finite_values() {
        let mut values: Vec<f64> = (0..40).map(|i| i as f64).collect();
        values[7] = f64::NAN;
        let ts = make_series(values);

        let mut model = ARIMA::new(5, 1, 0);
        assert!(matches!(model.fit(&ts), Err(ForecastError::MissingValues)));
    }

    #[test]
    fn arima_requires_fit() {
        let model = ARIMA::new(1, 1, 1);
        assert!(matches!(model.predict(5), Err(ForecastError::FitRequired)));
        assert!(!model.is_fitted());
    }

    #[test]
    fn arima_zero_horizon() {
        let values: Vec<f64> = (0..30).map(|i| i as f64 + (i % 3) as f64).collect();
        let ts = make_series(values);

        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&ts).unwrap();

        let forecast = model.predict(0).unwrap();
        assert_eq!(forecast.horizon(), 0);
    }

    #[test]
    fn constant_series_forecasts_flat() {
        let ts = make_series(vec![500.0; 40]);

        let mut model = ARIMA::new(5, 1, 0);
        model.fit(&ts).unwrap();

        let forecast = model.predict(10).unwrap();
        for v in forecast.point() {
            assert_relative_eq!(*v, 500.0, epsilon = 1e-9);
        }
        assert!(model.log_likelihood().is_none());
    }

    #[test]
    fn arima_spec() {
        let spec = ARIMASpec::new(5, 1, 0);
        assert!(!spec.include_constant);
        assert_eq!(spec.num_params(), 5);
        assert_eq!(spec.min_observations(), 12);
        assert_eq!(spec.to_string(), "ARIMA(5,1,0)");

        let spec = ARIMASpec::new(2, 0, 3);
        assert!(spec.include_constant);
        assert_eq!(spec.num_params(), 6);

        assert_eq!(ARIMASpec::default(), ARIMASpec::new(5, 1, 0));
    }

    #[test]
    fn arima_getters() {
        let e = noise(50, 5, 2.0);
        let values: Vec<f64> = (0..50).map(|i| 10.0 + i as f64 + e[i]).collect();
        let ts = make_series(values);

        let mut model = ARIMA::new(2, 1, 0);
        model.fit(&ts).unwrap();

        assert_eq!(model.name(), "ARIMA");
        assert!(model.is_fitted());
        assert_eq!(model.fitted_values().unwrap().len(), 49);
        assert_eq!(model.residuals().unwrap().len(), 49);
        assert!(model.iterations() > 0);
    }
}
