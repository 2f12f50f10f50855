//! Derivative-free minimization for likelihood estimation.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the spread of objective values.
    pub tolerance: f64,
    /// Reflection coefficient (default: 1.0).
    pub alpha: f64,
    /// Expansion coefficient (default: 2.0).
    pub gamma: f64,
    /// Contraction coefficient (default: 0.5).
    pub rho: f64,
    /// Shrinkage coefficient (default: 0.5).
    pub sigma: f64,
    /// Initial simplex step, relative to the magnitude of each coordinate.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

struct Vertex {
    point: Vec<f64>,
    value: f64,
}

/// Minimize `objective` with the Nelder-Mead simplex method.
///
/// Objective values that are NaN are treated as `+inf`, so an objective may
/// signal an infeasible point by returning `f64::INFINITY`.
///
/// # Example
/// ```
/// use ridership_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(objective: F, initial: &[f64], config: NelderMeadConfig) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let eval = |point: Vec<f64>| {
        let value = objective(&point);
        Vertex {
            point,
            value: if value.is_nan() { f64::INFINITY } else { value },
        }
    };

    let mut simplex: Vec<Vertex> = Vec::with_capacity(n + 1);
    simplex.push(eval(initial.to_vec()));
    for i in 0..n {
        let mut point = initial.to_vec();
        point[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        simplex.push(eval(point));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));

        let best = simplex[0].value;
        let worst = simplex[n].value;
        let second_worst = simplex[n - 1].value;

        if (worst - best).abs() < config.tolerance {
            converged = true;
            break;
        }

        let centroid = centroid(&simplex[..n]);
        let collapsed = simplex
            .iter()
            .map(|v| distance(&v.point, &centroid))
            .fold(0.0, f64::max)
            < config.tolerance;
        if collapsed {
            converged = true;
            break;
        }

        let reflected = eval(towards(&centroid, &simplex[n].point, -config.alpha));

        if reflected.value < best {
            let expanded = eval(towards(&centroid, &reflected.point, config.gamma));
            simplex[n] = if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            };
            continue;
        }

        if reflected.value < second_worst {
            simplex[n] = reflected;
            continue;
        }

        let contracted = if reflected.value < worst {
            eval(towards(&centroid, &reflected.point, config.rho))
        } else {
            eval(towards(&centroid, &simplex[n].point, config.rho))
        };
        if contracted.value < reflected.value.min(worst) {
            simplex[n] = contracted;
            continue;
        }

        let anchor = simplex[0].point.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk = towards(&anchor, &vertex.point, config.sigma);
            *vertex = eval(shrunk);
        }
    }

    let best = simplex
        .into_iter()
        .min_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal))
        .map(|v| (v.point, v.value))
        .unwrap_or((initial.to_vec(), f64::NAN));

    NelderMeadResult {
        optimal_point: best.0,
        optimal_value: best.1,
        iterations,
        converged,
    }
}

fn centroid(vertices: &[Vertex]) -> Vec<f64> {
    let dims = vertices[0].point.len();
    let mut c = vec![0.0; dims];
    for v in vertices {
        for (acc, x) in c.iter_mut().zip(&v.point) {
            *acc += x;
        }
    }
    c.iter_mut().for_each(|x| *x /= vertices.len() as f64);
    c
}

/// `origin + t * (point - origin)`; negative `t` reflects through `origin`.
fn towards(origin: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + t * (p - o))
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nelder_mead_quadratic_2d() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_value, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn nelder_mead_rosenbrock() {
        let config = NelderMeadConfig {
            max_iter: 5000,
            tolerance: 1e-12,
            ..Default::default()
        };

        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[0.0, 0.0],
            config,
        );

        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-2);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 1e-2);
    }

    #[test]
    fn infeasible_region_is_avoided() {
        // Minimum of (x-5)^2 restricted to x <= 3 through an infinite penalty.
        let result = nelder_mead(
            |x| {
                if x[0] > 3.0 {
                    f64::INFINITY
                } else {
                    (x[0] - 5.0).powi(2)
                }
            },
            &[1.0],
            NelderMeadConfig::default(),
        );

        assert!(result.optimal_point[0] <= 3.0);
        assert_relative_eq!(result.optimal_point[0], 3.0, epsilon = 1e-2);
    }

    #[test]
    fn nan_objective_counts_as_infeasible() {
        // Unconstrained minimum (0.2, 1.0) lies in the NaN region x < 0.8.
        let result = nelder_mead(
            |x| {
                if x[0] < 0.8 {
                    f64::NAN
                } else {
                    (x[0] - 0.2).powi(2) + (x[1] - 1.0).powi(2)
                }
            },
            &[1.5, 0.5],
            NelderMeadConfig::default(),
        );
        assert!(result.optimal_value.is_finite());
        assert_relative_eq!(result.optimal_point[0], 0.8, epsilon = 1e-2);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 1e-2);
    }

    #[test]
    fn nelder_mead_empty_initial() {
        let result = nelder_mead(|_| 0.0, &[], NelderMeadConfig::default());

        assert!(!result.converged);
        assert!(result.optimal_value.is_nan());
    }

    #[test]
    fn nelder_mead_3d() {
        let result = nelder_mead(
            |x| x[0].powi(2) + x[1].powi(2) + x[2].powi(2),
            &[1.0, 2.0, 3.0],
            NelderMeadConfig::default(),
        );

        assert!(result.converged);
        for coord in &result.optimal_point {
            assert_relative_eq!(*coord, 0.0, epsilon = 1e-3);
        }
    }
}
