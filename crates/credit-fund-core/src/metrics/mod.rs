pub mod returns;
pub mod risk;
pub mod stats;

pub use returns::{equity_multiple, irr, npv, solve_irr};
pub use risk::{correlations, max_drawdown, sharpe_ratio, value_at_risk, Correlations};
pub use stats::{sanitize, MeanStat, SummaryStats};
