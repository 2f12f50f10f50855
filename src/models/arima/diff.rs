//! Differencing utilities for ARIMA models.

/// Apply differencing `d` times.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Integrate (reverse differencing) forecasts made on the differenced scale.
///
/// `original` is the undifferenced history; its trailing values at each
/// differencing level seed the cumulative sums.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || differenced.is_empty() {
        return differenced.to_vec();
    }

    let mut result = differenced.to_vec();

    for level in (0..d).rev() {
        let anchor = difference(original, level).last().copied().unwrap_or(0.0);

        let mut cumsum = anchor;
        for value in result.iter_mut() {
            cumsum += *value;
            *value = cumsum;
        }
    }

    result
}
