use eval_core::EvalError;

use crate::models::RiskReport;
use crate::statistical::is_constant;

/// Decompose realized return variance against a single benchmark factor.
///
/// Both series must be aligned 1:1. All moments use the **population**
/// estimator (ddof = 0); using the same estimator for covariance and
/// variance makes beta exactly 1.0 for identical series.
pub fn decompose(returns: &[f64], benchmark_returns: &[f64]) -> Result<RiskReport, EvalError> {
    if returns.len() != benchmark_returns.len() {
        return Err(EvalError::InvalidInput(format!(
            "return series length {} does not match benchmark length {}",
            returns.len(),
            benchmark_returns.len()
        )));
    }
    if returns.len() < 2 {
        return Err(EvalError::InsufficientData(format!(
            "risk decomposition needs at least 2 observations, got {}",
            returns.len()
        )));
    }
    // Structural zero-variance checks; the accumulated variance of a
    // constant series is not exactly 0.0 under rounding.
    if is_constant(benchmark_returns) {
        return Err(EvalError::DegenerateInput(
            "benchmark variance is zero, beta is undefined".to_string(),
        ));
    }
    if is_constant(returns) {
        return Err(EvalError::DegenerateInput(
            "total risk is zero, risk contribution is undefined".to_string(),
        ));
    }

    let n = returns.len() as f64;
    let mean_r = returns.iter().sum::<f64>() / n;
    let mean_b = benchmark_returns.iter().sum::<f64>() / n;

    let covariance = returns
        .iter()
        .zip(benchmark_returns)
        .map(|(r, b)| (r - mean_r) * (b - mean_b))
        .sum::<f64>()
        / n;
    let benchmark_variance = benchmark_returns
        .iter()
        .map(|b| (b - mean_b).powi(2))
        .sum::<f64>()
        / n;

    let beta = covariance / benchmark_variance;

    let specific_risk: Vec<f64> = returns
        .iter()
        .zip(benchmark_returns)
        .map(|(r, b)| r - beta * b)
        .collect();

    let total_risk = (returns.iter().map(|r| (r - mean_r).powi(2)).sum::<f64>() / n).sqrt();

    // Equal-weighted marginal contribution proxy over the observation set;
    // intentionally not a cross-asset decomposition.
    let weight = 1.0 / n;
    let risk_contribution: Vec<f64> = returns.iter().map(|r| weight * r / total_risk).collect();

    Ok(RiskReport {
        beta,
        specific_risk,
        total_risk,
        risk_contribution,
    })
}
