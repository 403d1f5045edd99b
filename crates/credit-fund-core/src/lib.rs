pub mod config;
pub mod error;
pub mod loans;
pub mod metrics;
pub mod monte_carlo;
pub mod projection;
pub mod sampling;
pub mod types;
pub mod waterfall;

pub use config::{FundConfig, FundRates, Geography, WaterfallType, Zone};
pub use error::CreditFundError;
pub use monte_carlo::simulation::{
    run_simulation, run_simulation_with_observer, SimulationObserver, SimulationResult,
};
pub use types::*;

/// Standard result type for all credit-fund operations
pub type CreditFundResult<T> = Result<T, CreditFundError>;
