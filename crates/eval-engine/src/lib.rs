pub mod costs;
pub mod models;
pub mod monte_carlo;
pub mod orchestrator;
pub mod risk;
pub mod statistical;
pub mod window;

#[cfg(test)]
mod tests;

pub use costs::estimate_costs;
pub use models::*;
pub use monte_carlo::simulate_paths;
pub use orchestrator::{BacktestOrchestrator, RunState};
pub use risk::decompose;
pub use statistical::validate_returns;
pub use window::{WalkForwardSplitter, WindowPair};
