use chrono::{DateTime, TimeZone, Utc};

use eval_core::{EvalError, Strategy, TimeSeries, TimeSlice, TradeRecord, WindowOutcome};

use crate::models::{BrokerConfig, EvalConfig, MonteCarloConfig};
use crate::orchestrator::{BacktestOrchestrator, RunState};

/// Helper: a daily price series of length `n` with mild oscillation.
fn price_series(n: usize) -> TimeSeries {
    let base = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    let index: Vec<DateTime<Utc>> = (0..n)
        .map(|i| base + chrono::Duration::days(i as i64))
        .collect();
    let values: Vec<f64> = (0..n)
        .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.01)
        .collect();
    TimeSeries::new(index, values).unwrap()
}

/// Helper: a config sized for fast tests.
fn test_config(window_size: usize, forecast_horizon: usize, benchmark_len: usize) -> EvalConfig {
    EvalConfig {
        window_size,
        forecast_horizon,
        benchmark_returns: (0..benchmark_len)
            .map(|i| ((i as f64 * 1.3).sin()) * 0.008)
            .collect(),
        broker: BrokerConfig::default(),
        monte_carlo: MonteCarloConfig {
            num_simulations: 200,
            num_periods: 30,
        },
    }
}

/// A deterministic stand-in for the external strategy: one realized return
/// per test observation and one trade per test window.
#[derive(Default)]
struct StubStrategy {
    returns: Vec<f64>,
    trades: Vec<TradeRecord>,
    train_calls: usize,
    simulate_calls: usize,
}

impl Strategy for StubStrategy {
    fn train(&mut self, window: TimeSlice<'_>) -> Result<(), EvalError> {
        assert!(!window.is_empty());
        self.train_calls += 1;
        Ok(())
    }

    fn simulate(&mut self, window: TimeSlice<'_>) -> Result<WindowOutcome, EvalError> {
        self.simulate_calls += 1;
        let returns: Vec<f64> = window.values.iter().map(|v| (v * 7.0).sin() * 0.01).collect();
        let trades = vec![TradeRecord {
            timestamp: window.start_time().unwrap(),
            volume: 100.0 * self.simulate_calls as f64,
            spread: 0.01,
        }];
        self.returns.extend(&returns);
        self.trades.extend(trades.iter().cloned());
        Ok(WindowOutcome { returns, trades })
    }

    fn returns(&self) -> &[f64] {
        &self.returns
    }

    fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }
}

/// A strategy that fails during training.
struct BrokenStrategy;

impl Strategy for BrokenStrategy {
    fn train(&mut self, _window: TimeSlice<'_>) -> Result<(), EvalError> {
        Err(EvalError::Training("model did not converge".to_string()))
    }

    fn simulate(&mut self, _window: TimeSlice<'_>) -> Result<WindowOutcome, EvalError> {
        unreachable!("simulate must not be reached when training fails")
    }

    fn returns(&self) -> &[f64] {
        &[]
    }

    fn trades(&self) -> &[TradeRecord] {
        &[]
    }
}

// =============================================================================
// End-to-end: 300 daily observations, window 252, horizon 21
// =============================================================================

#[test]
fn full_pipeline_produces_complete_report() {
    let series = price_series(300);
    // floor((300 - 252) / 21) = 2 window pairs, 42 aggregate returns.
    let config = test_config(252, 21, 42);
    let mut strategy = StubStrategy::default();
    let mut orchestrator = BacktestOrchestrator::new(&series, config);

    let report = orchestrator.run(&mut strategy).unwrap();

    assert_eq!(orchestrator.state(), RunState::Completed);
    assert_eq!(strategy.train_calls, 2);
    assert_eq!(strategy.simulate_calls, 2);

    // Walk-forward results in window order, never reordered.
    assert_eq!(report.windows.len(), 2);
    assert_eq!(report.windows[0].window, 0);
    assert_eq!(report.windows[1].window, 1);
    assert_eq!(report.windows[0].returns.len(), 21);
    assert_eq!(report.windows[1].returns.len(), 21);
    assert_eq!(report.windows[0].test_start, series.index()[252]);
    assert_eq!(report.windows[1].train_start, series.index()[21]);

    // All four analyses populated from the aggregate series and ledger.
    assert_eq!(report.monte_carlo.paths.len(), 200);
    assert!(report.monte_carlo.sigma > 0.0);
    assert_eq!(report.risk.specific_risk.len(), 42);
    assert_eq!(report.risk.risk_contribution.len(), 42);
    assert!((0.0..=1.0).contains(&report.validation.normality.shapiro_wilk.p_value));
    assert_eq!(report.costs.spread_cost.len(), 2);
    assert!(report.costs.total_cost_percentage > 0.0);
}

#[test]
fn report_serializes_to_json() {
    let series = price_series(300);
    let config = test_config(252, 21, 42);
    let mut strategy = StubStrategy::default();
    let report = BacktestOrchestrator::new(&series, config)
        .run(&mut strategy)
        .unwrap();

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"monte_carlo\""));
    assert!(json.contains("\"risk_contribution\""));
}

// =============================================================================
// Failure propagation: first error aborts the run with stage context
// =============================================================================

#[test]
fn invalid_configuration_fails_before_any_stage() {
    let series = price_series(100);
    let mut config = test_config(30, 7, 10);
    config.window_size = 0;
    let mut strategy = StubStrategy::default();

    let err = BacktestOrchestrator::new(&series, config)
        .run(&mut strategy)
        .unwrap_err();

    assert!(matches!(
        err.root_cause(),
        EvalError::InvalidConfiguration(_)
    ));
    assert_eq!(strategy.train_calls, 0);
    assert_eq!(strategy.simulate_calls, 0);
}

#[test]
fn training_failure_is_fatal_with_walk_forward_context() {
    let series = price_series(100);
    let config = test_config(30, 7, 10);

    let err = BacktestOrchestrator::new(&series, config)
        .run(&mut BrokenStrategy)
        .unwrap_err();

    assert!(matches!(err.root_cause(), EvalError::Training(_)));
    assert!(err.to_string().contains("walk-forward"));
}

#[test]
fn benchmark_length_mismatch_fails_in_risk_stage() {
    let series = price_series(300);
    // 42 strategy returns but only 10 benchmark observations.
    let config = test_config(252, 21, 10);
    let mut strategy = StubStrategy::default();

    let err = BacktestOrchestrator::new(&series, config)
        .run(&mut strategy)
        .unwrap_err();

    assert!(matches!(err.root_cause(), EvalError::InvalidInput(_)));
    assert!(err.to_string().contains("risk-decomposition"));
}

#[test]
fn zero_windows_is_not_itself_an_error() {
    // Series shorter than one train+test span: walk-forward yields zero
    // pairs, so the run proceeds and only fails later, when the Monte Carlo
    // stage sees the strategy's empty aggregate return series.
    let series = price_series(50);
    let config = test_config(252, 21, 10);
    let mut strategy = StubStrategy::default();

    let err = BacktestOrchestrator::new(&series, config)
        .run(&mut strategy)
        .unwrap_err();

    assert_eq!(strategy.train_calls, 0);
    assert!(matches!(err.root_cause(), EvalError::InsufficientData(_)));
    assert!(err.to_string().contains("monte-carlo"));
}
