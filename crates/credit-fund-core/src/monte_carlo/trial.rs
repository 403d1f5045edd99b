use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::FundConfig;
use crate::loans::Loan;
use crate::metrics::{equity_multiple, irr, max_drawdown, sharpe_ratio, solve_irr};
use crate::metrics::risk::RISK_FREE_RATE;
use crate::projection::{project_cash_flows, ProjectionOutput};
use crate::sampling::perturb;
use crate::types::{Money, Multiple, Rate};
use crate::CreditFundResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything one trial contributes to the cross-trial aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialOutcome {
    pub projection: ProjectionOutput,
    /// Fund IRR, 0.0 when undetermined
    pub irr: Rate,
    /// False when `irr` is the undetermined sentinel
    pub irr_determined: bool,
    pub gp_irr: Rate,
    pub equity_multiple: Multiple,
    /// Sum of positive cash flows after year 0
    pub final_value: Money,
    /// Sum of all cash flows after year 0
    pub net_distributions: Money,
    pub sharpe_ratio: f64,
    pub max_drawdown: Rate,
}

// ---------------------------------------------------------------------------
// Perturbation
// ---------------------------------------------------------------------------

/// Copy of `config` with the interest, appreciation, default and early
/// repayment rates each scaled by independent `1 + N(0, volatility)` noise.
pub fn perturb_config<R: Rng + ?Sized>(config: &FundConfig, rng: &mut R) -> FundConfig {
    let sd = config.rates().volatility;
    FundConfig {
        interest_rate: perturb(rng, config.interest_rate, sd),
        property_appreciation: perturb(rng, config.property_appreciation, sd),
        default_rate: perturb(rng, config.default_rate, sd),
        early_repayment_rate: perturb(rng, config.early_repayment_rate, sd),
        ..config.clone()
    }
}

/// Year-on-year returns `cash_flows[t] / portfolio_values[t - 1]`, skipping
/// years that follow a zero portfolio value.
pub fn annual_returns(cash_flows: &[Money], portfolio_values: &[Money]) -> Vec<Rate> {
    (1..cash_flows.len().min(portfolio_values.len() + 1))
        .filter(|&t| portfolio_values[t - 1] != 0.0)
        .map(|t| cash_flows[t] / portfolio_values[t - 1])
        .collect()
}

// ---------------------------------------------------------------------------
// Trial
// ---------------------------------------------------------------------------

/// Run one trial: perturb the market rates, project the fund over a private
/// copy of `base_loans` and score the result.
pub fn run_trial<R: Rng + ?Sized>(
    config: &FundConfig,
    base_loans: &[Loan],
    rng: &mut R,
) -> CreditFundResult<TrialOutcome> {
    let trial_config = perturb_config(config, rng);
    let mut projection = project_cash_flows(&trial_config, base_loans, rng)?;
    // aggregation only reads the series and counters
    projection.loans = Vec::new();

    let cash_flows = &projection.cash_flows;
    let solved = solve_irr(cash_flows);
    let irr_determined = solved.is_ok();
    let fund_irr = solved.unwrap_or(0.0);
    let gp_irr = irr(&projection.gp_cash_flows);
    let multiple = equity_multiple(cash_flows);
    let final_value: Money = cash_flows.iter().skip(1).filter(|cf| **cf > 0.0).sum();
    let net_distributions: Money = cash_flows.iter().skip(1).sum();
    let returns = annual_returns(cash_flows, &projection.portfolio_values);
    let sharpe = sharpe_ratio(&returns, RISK_FREE_RATE);
    let drawdown = max_drawdown(cash_flows);

    Ok(TrialOutcome {
        irr: fund_irr,
        irr_determined,
        gp_irr,
        equity_multiple: multiple,
        final_value,
        net_distributions,
        sharpe_ratio: sharpe,
        max_drawdown: drawdown,
        projection,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loans::generate_portfolio;
    use crate::sampling::fund_rng;

    #[test]
    fn test_zero_volatility_leaves_config_unchanged() {
        let config = FundConfig {
            volatility: 0.0,
            ..FundConfig::default()
        };
        let mut rng = fund_rng(Some(3));
        assert_eq!(perturb_config(&config, &mut rng), config);
    }

    #[test]
    fn test_perturbation_touches_only_market_rates() {
        let config = FundConfig {
            volatility: 20.0,
            ..FundConfig::default()
        };
        let mut rng = fund_rng(Some(3));
        let p = perturb_config(&config, &mut rng);
        assert_ne!(p.interest_rate, config.interest_rate);
        assert_ne!(p.default_rate, config.default_rate);
        assert_eq!(p.management_fee, config.management_fee);
        assert_eq!(p.hurdle_rate, config.hurdle_rate);
        assert_eq!(p.reinvestment_rate, config.reinvestment_rate);
        assert_eq!(p.zone_allocation, config.zone_allocation);
    }

    #[test]
    fn test_annual_returns_skip_zero_base() {
        let r = annual_returns(&[-100.0, 10.0, 20.0, 30.0], &[100.0, 0.0, 200.0, 200.0]);
        // year 2 follows a zero value and is skipped
        assert_eq!(r, vec![0.1, 0.15]);
    }

    #[test]
    fn test_trial_scores_projection() {
        let config = FundConfig {
            volatility: 0.0,
            default_rate: 0.0,
            early_repayment_rate: 0.0,
            ..FundConfig::default()
        };
        let mut rng = fund_rng(Some(11));
        let base = generate_portfolio(&config, &mut rng).unwrap();
        let trial = run_trial(&config, &base, &mut rng).unwrap();

        let cfs = &trial.projection.cash_flows;
        assert_eq!(cfs[0], -config.initial_investment);
        assert!(trial.irr > 0.0);
        assert!(trial.irr_determined);
        assert!(trial.equity_multiple > 0.0);
        let positive: f64 = cfs[1..].iter().filter(|c| **c > 0.0).sum();
        assert!((trial.final_value - positive).abs() < 1e-6);
        assert_eq!(trial.gp_irr, irr(&trial.projection.gp_cash_flows));
        assert_eq!(trial.irr, irr(cfs));
    }

    #[test]
    fn test_trial_releases_loan_book() {
        let config = FundConfig::default();
        let mut rng = fund_rng(Some(11));
        let base = generate_portfolio(&config, &mut rng).unwrap();
        let trial = run_trial(&config, &base, &mut rng).unwrap();
        assert!(trial.projection.loans.is_empty());
        assert!(trial.projection.loans_created >= base.len());
    }

    #[test]
    fn test_irr_flag_matches_solver() {
        let config = FundConfig {
            default_rate: 40.0,
            ..FundConfig::default()
        };
        for seed in 0..6 {
            let mut rng = fund_rng(Some(seed));
            let base = generate_portfolio(&config, &mut rng).unwrap();
            let trial = run_trial(&config, &base, &mut rng).unwrap();
            let cfs = &trial.projection.cash_flows;
            assert_eq!(trial.irr_determined, solve_irr(cfs).is_ok());
            assert_eq!(trial.irr, irr(cfs));
        }
    }
}
