use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eval_core::EvalError;

/// Configuration for a full evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Training window length in observations.
    pub window_size: usize,
    /// Test window length in observations (also the step size).
    pub forecast_horizon: usize,
    /// Benchmark return series for risk decomposition. Must be aligned 1:1
    /// with the strategy's aggregate realized returns.
    pub benchmark_returns: Vec<f64>,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
}

impl EvalConfig {
    /// Eager validation, run before any pipeline stage.
    pub fn validate(&self) -> Result<(), EvalError> {
        if self.window_size < 1 {
            return Err(EvalError::InvalidConfiguration(
                "window_size must be >= 1".to_string(),
            ));
        }
        if self.forecast_horizon < 1 {
            return Err(EvalError::InvalidConfiguration(
                "forecast_horizon must be >= 1".to_string(),
            ));
        }
        if self.benchmark_returns.is_empty() {
            return Err(EvalError::InvalidConfiguration(
                "benchmark_returns must not be empty".to_string(),
            ));
        }
        self.broker.validate()?;
        self.monte_carlo.validate()
    }
}

/// Per-unit-volume cost rates charged by the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub commission_rate: f64,
    pub slippage_rate: f64,
    pub market_impact_rate: f64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            commission_rate: 0.001,
            slippage_rate: 0.0005,
            market_impact_rate: 0.0001,
        }
    }
}

impl BrokerConfig {
    pub fn validate(&self) -> Result<(), EvalError> {
        for (name, rate) in [
            ("commission_rate", self.commission_rate),
            ("slippage_rate", self.slippage_rate),
            ("market_impact_rate", self.market_impact_rate),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(EvalError::InvalidConfiguration(format!(
                    "{name} must be a finite value >= 0, got {rate}"
                )));
            }
        }
        Ok(())
    }
}

/// Monte Carlo path generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    pub num_simulations: usize,
    pub num_periods: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        // One year of daily periods, matching the historical defaults.
        Self {
            num_simulations: 10_000,
            num_periods: 252,
        }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<(), EvalError> {
        if self.num_simulations < 1 {
            return Err(EvalError::InvalidConfiguration(
                "num_simulations must be >= 1".to_string(),
            ));
        }
        if self.num_periods < 1 {
            return Err(EvalError::InvalidConfiguration(
                "num_periods must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

// --- Monte Carlo ---

/// A lower/upper confidence band over simulation periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Cross-sectional confidence intervals at each period across all paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceIntervals {
    /// 2.5th / 97.5th percentile band.
    pub p95: ConfidenceBand,
    /// 0.5th / 99.5th percentile band.
    pub p99: ConfidenceBand,
}

/// Result of a Monte Carlo path simulation. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Fitted mean of the historical return sample (population estimator).
    pub mu: f64,
    /// Fitted standard deviation of the sample (population estimator).
    pub sigma: f64,
    /// `num_simulations` rows of `num_periods` compounded portfolio values,
    /// each path starting from an implicit base of 1.0.
    pub paths: Vec<Vec<f64>>,
    pub confidence: ConfidenceIntervals,
}

// --- Risk decomposition ---

/// Decomposition of realized return variance against a single benchmark
/// factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    /// Systematic exposure: Cov(returns, benchmark) / Var(benchmark).
    pub beta: f64,
    /// Idiosyncratic residual series: returns - beta * benchmark.
    pub specific_risk: Vec<f64>,
    /// Population standard deviation of the return series.
    pub total_risk: f64,
    /// Equal-weighted marginal contribution proxy, aligned 1:1 with the
    /// input returns: (1/N) * return_i / total_risk.
    pub risk_contribution: Vec<f64>,
}

// --- Statistical validation ---

/// A test statistic with its associated p-value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

/// Anderson-Darling reports critical values rather than a p-value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AndersonDarlingOutcome {
    /// Small-sample-adjusted A^2 statistic.
    pub statistic: f64,
    /// Critical values for the normal case.
    pub critical_values: Vec<f64>,
    /// Significance levels (percent) matching `critical_values`.
    pub significance_levels: Vec<f64>,
}

/// Three independent tests of departure from normality. No combined
/// verdict: the caller interprets each test on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalityTests {
    pub shapiro_wilk: TestOutcome,
    pub jarque_bera: TestOutcome,
    pub anderson_darling: AndersonDarlingOutcome,
}

/// Tests of serial independence of the return series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndependenceTests {
    /// Joint autocorrelation test up to `lag`.
    pub ljung_box: TestOutcome,
    /// Wald-Wolfowitz runs test on the sign sequence.
    pub runs_test: TestOutcome,
    /// Lag used by the Ljung-Box test and the autocorrelation function.
    pub lag: usize,
}

/// Full diagnostic report over a return sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub normality: NormalityTests,
    pub independence: IndependenceTests,
    /// Sample autocorrelation function at lags 1..=lag.
    pub autocorrelation: Vec<f64>,
}

// --- Transaction costs ---

/// Per-trade cost components, each aligned 1:1 with the ledger rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub spread_cost: Vec<f64>,
    pub commission: Vec<f64>,
    pub slippage: Vec<f64>,
    pub market_impact: Vec<f64>,
    /// Sum of all four components across all rows.
    pub total_cost: f64,
    /// total_cost / total traded volume.
    pub total_cost_percentage: f64,
}

// --- Walk-forward / report assembly ---

/// Strategy results for one walk-forward window, in window order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowReport {
    /// Zero-based window number.
    pub window: usize,
    pub train_start: DateTime<Utc>,
    pub train_end: DateTime<Utc>,
    pub test_start: DateTime<Utc>,
    pub test_end: DateTime<Utc>,
    /// Realized per-period returns on the test window.
    pub returns: Vec<f64>,
    pub trade_count: usize,
}

/// The combined evaluation report. An immutable value object: a failed run
/// produces no report at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub windows: Vec<WindowReport>,
    pub monte_carlo: SimulationResult,
    pub risk: RiskReport,
    pub validation: ValidationReport,
    pub costs: CostBreakdown,
}
