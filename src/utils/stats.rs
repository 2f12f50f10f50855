//! Statistical utility functions.

use statrs::distribution::{Continuous, Normal};

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Partial autocorrelations implied by AR coefficients.
///
/// Runs the Levinson-Durbin recursion backwards (step-down). Returns `None`
/// as soon as a reflection coefficient reaches magnitude 1, i.e. when the
/// polynomial `1 - a1*z - ... - ap*z^p` has a root on or inside the unit
/// circle.
pub fn reflection_coefficients(ar: &[f64]) -> Option<Vec<f64>> {
    let mut current = ar.to_vec();
    let mut reflections = vec![0.0; ar.len()];

    for k in (1..=ar.len()).rev() {
        let r = current[k - 1];
        if !r.is_finite() || r.abs() >= 1.0 {
            return None;
        }
        reflections[k - 1] = r;

        let denom = 1.0 - r * r;
        current = (0..k - 1)
            .map(|j| (current[j] + r * current[k - 2 - j]) / denom)
            .collect();
    }

    Some(reflections)
}

/// Check whether AR coefficients describe a stationary process.
pub fn is_stationary(ar: &[f64]) -> bool {
    reflection_coefficients(ar).is_some()
}

/// Check whether MA coefficients describe an invertible process.
///
/// `1 + b1*z + ... + bq*z^q` is invertible iff the AR test accepts `-b`.
pub fn is_invertible(ma: &[f64]) -> bool {
    let negated: Vec<f64> = ma.iter().map(|b| -b).collect();
    is_stationary(&negated)
}

/// Gaussian log-likelihood of zero-mean residuals with variance `sigma2`.
///
/// Returns `None` for a non-positive or non-finite variance.
pub fn gaussian_log_likelihood(residuals: &[f64], sigma2: f64) -> Option<f64> {
    if !(sigma2.is_finite() && sigma2 > 0.0) {
        return None;
    }
    let normal = Normal::new(0.0, sigma2.sqrt()).ok()?;
    Some(residuals.iter().map(|&r| normal.ln_pdf(r)).sum())
}
