use thiserror::Error;

/// Error taxonomy for the evaluation pipeline.
///
/// Every error is fatal to the current run: nothing is retried or silently
/// swallowed. `Stage` wraps a failure with the pipeline stage it occurred in
/// so the caller can diagnose which analysis rejected which input.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Strategy training failed: {0}")]
    Training(String),

    #[error("Strategy simulation failed: {0}")]
    Simulation(String),

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<EvalError>,
    },
}

impl EvalError {
    /// Attach pipeline-stage context to an error. Already-wrapped errors are
    /// left alone so the innermost stage wins.
    pub fn in_stage(self, stage: &'static str) -> Self {
        match self {
            EvalError::Stage { .. } => self,
            other => EvalError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, unwrapping any stage context.
    pub fn root_cause(&self) -> &EvalError {
        match self {
            EvalError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
