use tracing::{debug, info};

use eval_core::{EvalError, Strategy, TimeSeries};

use crate::costs::estimate_costs;
use crate::models::{BacktestReport, EvalConfig, WindowReport};
use crate::monte_carlo::simulate_paths;
use crate::risk::decompose;
use crate::statistical::validate_returns;
use crate::window::WalkForwardSplitter;

/// Pipeline state of a single evaluation run.
///
/// Transitions are unconditional on success; the first failure aborts the
/// run as a whole and no partial report is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initialized,
    WalkForwardRunning,
    SimulationRunning,
    RiskAnalysisRunning,
    ValidationRunning,
    CostAnalysisRunning,
    Completed,
}

impl RunState {
    fn name(self) -> &'static str {
        match self {
            RunState::Initialized => "initialization",
            RunState::WalkForwardRunning => "walk-forward",
            RunState::SimulationRunning => "monte-carlo",
            RunState::RiskAnalysisRunning => "risk-decomposition",
            RunState::ValidationRunning => "statistical-validation",
            RunState::CostAnalysisRunning => "cost-analysis",
            RunState::Completed => "completed",
        }
    }
}

/// Drives the full evaluation pipeline: walk-forward retraining of the
/// external strategy, then Monte Carlo simulation, risk decomposition,
/// statistical validation and cost analysis over the strategy's aggregate
/// realized returns and trade ledger.
pub struct BacktestOrchestrator<'a> {
    data: &'a TimeSeries,
    config: EvalConfig,
    state: RunState,
}

impl<'a> BacktestOrchestrator<'a> {
    pub fn new(data: &'a TimeSeries, config: EvalConfig) -> Self {
        Self {
            data,
            config,
            state: RunState::Initialized,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn advance(&mut self, next: RunState) {
        info!(from = self.state.name(), to = next.name(), "stage transition");
        self.state = next;
    }

    /// Run the whole pipeline against `strategy` and assemble one report.
    ///
    /// Configuration is validated eagerly before any stage runs. The four
    /// post-walk-forward analyses have no data dependency on each other;
    /// they run in a fixed order here, each on an immutable snapshot of the
    /// strategy's aggregate returns and trades.
    pub fn run<S: Strategy>(&mut self, strategy: &mut S) -> Result<BacktestReport, EvalError> {
        self.config
            .validate()
            .map_err(|e| e.in_stage("initialization"))?;

        self.advance(RunState::WalkForwardRunning);
        let windows = self.walk_forward(strategy).map_err(|e| e.in_stage("walk-forward"))?;

        let returns = strategy.returns().to_vec();
        let trades = strategy.trades().to_vec();

        self.advance(RunState::SimulationRunning);
        let monte_carlo = simulate_paths(&returns, &self.config.monte_carlo)
            .map_err(|e| e.in_stage("monte-carlo"))?;

        self.advance(RunState::RiskAnalysisRunning);
        let risk = decompose(&returns, &self.config.benchmark_returns)
            .map_err(|e| e.in_stage("risk-decomposition"))?;

        self.advance(RunState::ValidationRunning);
        let validation =
            validate_returns(&returns).map_err(|e| e.in_stage("statistical-validation"))?;

        self.advance(RunState::CostAnalysisRunning);
        let costs =
            estimate_costs(&trades, &self.config.broker).map_err(|e| e.in_stage("cost-analysis"))?;

        self.advance(RunState::Completed);
        Ok(BacktestReport {
            windows,
            monte_carlo,
            risk,
            validation,
            costs,
        })
    }

    /// Retrain and evaluate the strategy over successive window pairs,
    /// strictly in window order. Zero pairs is not an error: the result
    /// list is simply empty.
    fn walk_forward<S: Strategy>(
        &self,
        strategy: &mut S,
    ) -> Result<Vec<WindowReport>, EvalError> {
        let splitter = WalkForwardSplitter::new(
            self.data,
            self.config.window_size,
            self.config.forecast_horizon,
        )?;

        let mut reports = Vec::new();
        for (i, pair) in splitter.enumerate() {
            debug!(
                window = i,
                train_len = pair.train.len(),
                test_len = pair.test.len(),
                "walk-forward window"
            );

            strategy.train(pair.train)?;
            let outcome = strategy.simulate(pair.test)?;

            // Slices produced by the splitter are never empty, so the
            // boundary timestamps always exist.
            reports.push(WindowReport {
                window: i,
                train_start: pair.train.start_time().ok_or_else(empty_window)?,
                train_end: pair.train.end_time().ok_or_else(empty_window)?,
                test_start: pair.test.start_time().ok_or_else(empty_window)?,
                test_end: pair.test.end_time().ok_or_else(empty_window)?,
                trade_count: outcome.trades.len(),
                returns: outcome.returns,
            });
        }

        info!(windows = reports.len(), "walk-forward complete");
        Ok(reports)
    }
}

fn empty_window() -> EvalError {
    EvalError::InvalidInput("window slice is unexpectedly empty".to_string())
}
