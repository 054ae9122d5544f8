use rand::distributions::Distribution;
use rand::thread_rng;
use rayon::prelude::*;
use statrs::distribution::Normal;

use eval_core::EvalError;

use crate::models::{ConfidenceBand, ConfidenceIntervals, MonteCarloConfig, SimulationResult};
use crate::statistical::is_constant;

/// Simulate forward portfolio paths from a historical return sample.
///
/// Fits Normal(mu, sigma) to the sample using the **population** estimator
/// (ddof = 0) for both moments, then generates `num_simulations` independent
/// paths of `num_periods` i.i.d. draws. Each path is compounded into
/// portfolio values `v_t = prod(1 + r_k)` from an implicit base of 1.0.
///
/// Confidence intervals are cross-sectional: at each period t the
/// 2.5/97.5 (95% band) and 0.5/99.5 (99% band) percentiles are taken over
/// the simulated values at t across all paths, with linear interpolation
/// between order statistics.
pub fn simulate_paths(
    returns: &[f64],
    config: &MonteCarloConfig,
) -> Result<SimulationResult, EvalError> {
    config.validate()?;

    if returns.len() < 2 {
        return Err(EvalError::InsufficientData(format!(
            "Monte Carlo needs a return sample of length >= 2, got {}",
            returns.len()
        )));
    }
    if let Some(bad) = returns.iter().find(|r| !r.is_finite()) {
        return Err(EvalError::InvalidInput(format!(
            "return sample contains non-finite value {bad}"
        )));
    }

    // Degeneracy is structural: a constant sample's accumulated variance
    // carries rounding noise and is not exactly 0.0.
    let (mu, sigma) = if is_constant(returns) {
        (returns[0], 0.0)
    } else {
        let n = returns.len() as f64;
        let mu = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mu).powi(2)).sum::<f64>() / n;
        (mu, variance.sqrt())
    };

    let paths = if sigma == 0.0 {
        // Degenerate sample: every draw equals mu, so all paths are the
        // deterministic compounding of (1 + mu). Not an error.
        tracing::warn!(mu, "zero-variance return sample, paths are deterministic");
        let path: Vec<f64> = (1..=config.num_periods)
            .map(|t| (1.0 + mu).powi(t as i32))
            .collect();
        vec![path; config.num_simulations]
    } else {
        // Normal::new only rejects sigma <= 0 or non-finite params, both
        // excluded above.
        let normal = Normal::new(mu, sigma)
            .map_err(|e| EvalError::InvalidInput(format!("cannot fit normal model: {e}")))?;

        (0..config.num_simulations)
            .into_par_iter()
            .map(|_| {
                let mut rng = thread_rng();
                let mut value = 1.0;
                (0..config.num_periods)
                    .map(|_| {
                        value *= 1.0 + normal.sample(&mut rng);
                        value
                    })
                    .collect()
            })
            .collect()
    };

    let confidence = confidence_intervals(&paths, config.num_periods);

    Ok(SimulationResult {
        mu,
        sigma,
        paths,
        confidence,
    })
}

/// Percentile bands computed per period across all paths.
fn confidence_intervals(paths: &[Vec<f64>], num_periods: usize) -> ConfidenceIntervals {
    let mut p95 = ConfidenceBand {
        lower: Vec::with_capacity(num_periods),
        upper: Vec::with_capacity(num_periods),
    };
    let mut p99 = ConfidenceBand {
        lower: Vec::with_capacity(num_periods),
        upper: Vec::with_capacity(num_periods),
    };

    let mut column: Vec<f64> = Vec::with_capacity(paths.len());
    for t in 0..num_periods {
        column.clear();
        column.extend(paths.iter().map(|p| p[t]));
        column.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        p95.lower.push(percentile_sorted(&column, 2.5));
        p95.upper.push(percentile_sorted(&column, 97.5));
        p99.lower.push(percentile_sorted(&column, 0.5));
        p99.upper.push(percentile_sorted(&column, 99.5));
    }

    ConfidenceIntervals { p95, p99 }
}

/// Linear-interpolation percentile over a sorted slice (numpy default).
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
    }
}
