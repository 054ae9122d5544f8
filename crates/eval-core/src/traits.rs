use crate::error::EvalError;
use crate::types::{TimeSlice, TradeRecord};

/// Per-window output of a strategy simulation: the realized returns on the
/// test window and the trades executed while producing them.
#[derive(Debug, Clone)]
pub struct WindowOutcome {
    pub returns: Vec<f64>,
    pub trades: Vec<TradeRecord>,
}

/// The external trading strategy driven by the orchestrator.
///
/// The orchestrator calls `train` on each training window and `simulate` on
/// the window that immediately follows it. Across all windows the strategy
/// accumulates its full realized return series and trade ledger, which the
/// post-walk-forward analyses read through `returns` and `trades`.
pub trait Strategy {
    /// Fit the strategy to a training window.
    fn train(&mut self, window: TimeSlice<'_>) -> Result<(), EvalError>;

    /// Trade the strategy over a test window, returning the realized
    /// per-period returns and the trades executed.
    fn simulate(&mut self, window: TimeSlice<'_>) -> Result<WindowOutcome, EvalError>;

    /// Aggregate realized return series across all simulated windows so far.
    fn returns(&self) -> &[f64];

    /// Aggregate trade ledger across all simulated windows so far.
    fn trades(&self) -> &[TradeRecord];
}
