pub mod capital;
pub mod cash_flows;

pub use capital::{CapitalLedger, CapitalMetrics, DeploymentQueue};
pub use cash_flows::{project_cash_flows, ProjectionOutput};
