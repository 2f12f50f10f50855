//! Least-squares regression of a series on its own lags.
//!
//! Used to seed the ARIMA likelihood search with the conditional
//! least-squares AR estimate, which is exact for pure AR models.

use crate::error::{ForecastError, Result};

/// Coefficients of `y[t] = c + a1*y[t-1] + ... + ap*y[t-p]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LaggedFit {
    /// Lag coefficients, lag 1 first.
    pub coefficients: Vec<f64>,
    /// Constant term (0 when fitted without a constant).
    pub intercept: f64,
}

/// Fit an autoregression of order `p` by ordinary least squares.
///
/// Uses Cholesky decomposition to solve the normal equations. The first `p`
/// observations only serve as lagged regressors.
pub fn lagged_least_squares(y: &[f64], p: usize, include_constant: bool) -> Result<LaggedFit> {
    let num_params = p + usize::from(include_constant);
    let needed = p + num_params.max(1);

    if y.len() < needed {
        return Err(ForecastError::InsufficientData {
            needed,
            got: y.len(),
        });
    }

    if num_params == 0 {
        return Ok(LaggedFit {
            coefficients: vec![],
            intercept: 0.0,
        });
    }

    let offset = usize::from(include_constant);
    let mut xtx = vec![vec![0.0; num_params]; num_params];
    let mut xty = vec![0.0; num_params];
    let mut row = vec![0.0; num_params];

    for t in p..y.len() {
        // row = [1?, y[t-1], ..., y[t-p]]
        if include_constant {
            row[0] = 1.0;
        }
        for lag in 1..=p {
            row[offset + lag - 1] = y[t - lag];
        }

        for i in 0..num_params {
            xty[i] += row[i] * y[t];
            for j in 0..num_params {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    // Add small regularization to diagonal for numerical stability
    for i in 0..num_params {
        xtx[i][i] += 1e-8;
    }

    let beta = solve_symmetric(&xtx, &xty).ok_or_else(|| {
        ForecastError::ComputationError(
            "lagged regression failed: matrix not positive definite".into(),
        )
    })?;

    Ok(LaggedFit {
        intercept: if include_constant { beta[0] } else { 0.0 },
        coefficients: beta[offset..].to_vec(),
    })
}

/// Solve symmetric positive definite system using Cholesky decomposition.
///
/// Solves A @ x = b where A is symmetric positive definite.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // Cholesky decomposition A = L @ L'
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // Forward substitution: L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}
