pub mod simulation;
pub mod trial;

pub use simulation::{
    aggregate, run_simulation, run_simulation_with_observer, LpGpSeries, RiskStats,
    SimulationObserver, SimulationResult, SimulationStatistics, TimeSeries,
};
pub use trial::{annual_returns, perturb_config, run_trial, TrialOutcome};
