//! Year-by-year fund projection.
//!
//! Each call owns a private copy of the loan book. Capital is deployed first
//! for the whole deployment period, then every year active loans are tested
//! for default, early repayment and maturity (in that order), proceeds are
//! partly recycled into new loans while the reinvestment window is open, and
//! the capital position is recorded.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::FundConfig;
use crate::loans::{Loan, LoanEvent, LoanGenerator};
use crate::sampling::uniform;
use crate::types::{Money, Rate};
use crate::waterfall::{apply_waterfall, RevenueStreams, WaterfallTerms};
use crate::CreditFundResult;

use super::capital::{CapitalLedger, CapitalMetrics, DeploymentQueue};

/// Result of a single projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionOutput {
    /// Net fund cash flow; index 0 is `-initial_investment`
    pub cash_flows: Vec<Money>,
    /// `invested + available` at each year end
    pub portfolio_values: Vec<Money>,
    pub lp_cash_flows: Vec<Money>,
    pub gp_cash_flows: Vec<Money>,
    /// Capital position for years `0..=time_horizon`
    pub capital_metrics: Vec<CapitalMetrics>,
    pub revenue_streams: RevenueStreams,
    /// Early repayments over all loans ever created
    pub early_repayment_rate: Rate,
    pub loans_created: usize,
    pub early_repayments: usize,
    pub defaults: usize,
    /// Cash still uninvested when the deployment phase ends
    pub undeployed_capital: Money,
    /// Final state of every loan, base portfolio first. Emptied by
    /// `run_trial` once the trial is scored.
    pub loans: Vec<Loan>,
}

/// What happened to an active loan in a given year.
fn yearly_event<R: Rng + ?Sized>(
    loan: &Loan,
    year: u32,
    default_rate: Rate,
    early_repayment_rate: Rate,
    rng: &mut R,
) -> Option<LoanEvent> {
    let years_active = loan.years_active(year);
    if uniform(rng) < default_rate {
        return Some(LoanEvent::Default);
    }
    if years_active < loan.term_years && uniform(rng) < early_repayment_rate {
        return Some(LoanEvent::EarlyRepay);
    }
    if years_active >= loan.term_years {
        return Some(LoanEvent::Mature);
    }
    None
}

/// Project yearly fund cash flows for `config` over a copy of `base_loans`.
///
/// `base_loans` is never modified; pending loans in it are deployed into the
/// copy. Reinvestment loans are drawn with `config`'s own parameters.
pub fn project_cash_flows<R: Rng + ?Sized>(
    config: &FundConfig,
    base_loans: &[Loan],
    rng: &mut R,
) -> CreditFundResult<ProjectionOutput> {
    let rates = config.rates();
    let horizon = config.time_horizon as usize;
    let generator = LoanGenerator::new(config)?;

    let mut loans: Vec<Loan> = base_loans.to_vec();
    let mut ledger = CapitalLedger::new(config.initial_investment);

    let mut cash_flows = vec![0.0; horizon + 1];
    let mut portfolio_values = vec![0.0; horizon + 1];
    let mut capital_metrics = Vec::with_capacity(horizon + 1);
    cash_flows[0] = -config.initial_investment;
    portfolio_values[0] = ledger.total();
    capital_metrics.push(ledger.snapshot());

    // --- Deployment phase ---
    let deployment_years =
        (config.initial_deployment_period.floor() as u32).min(config.time_horizon);
    let yearly_budget = config.initial_investment / config.initial_deployment_period;
    let mut queue = DeploymentQueue::from_loans(&loans);
    for year in 1..=deployment_years {
        let budget = yearly_budget.min(ledger.available);
        let deployed = queue.deploy_year(&mut loans, year, budget)?;
        ledger.deploy(deployed);
    }
    let undeployed_capital = ledger.available;

    let mut loans_created = loans.len();
    let mut early_repayments = 0usize;
    let mut defaults = 0usize;

    // --- Yearly loop ---
    for year in 1..=config.time_horizon {
        let mut returns_this_year = 0.0;

        for idx in 0..loans.len() {
            let loan = &loans[idx];
            if !loan.is_active() || loan.start_year > year {
                continue;
            }
            let Some(event) = yearly_event(
                loan,
                year,
                rates.default_rate,
                rates.early_repayment_rate,
                rng,
            ) else {
                continue;
            };
            returns_this_year += loan.settlement(event, year);
            match event {
                LoanEvent::Default => defaults += 1,
                LoanEvent::EarlyRepay => early_repayments += 1,
                _ => {}
            }
            loans[idx] = loans[idx].transition(event)?;
        }

        let y = year as usize;
        cash_flows[y] = returns_this_year;

        // --- Reinvestment ---
        if f64::from(year) <= config.last_reinvestment_year {
            let reinvested = returns_this_year * rates.reinvestment_rate;
            ledger.recycle(reinvested);
            cash_flows[y] -= reinvested;

            while ledger.available >= generator.average_loan_size() {
                let drawn = generator.generate_loan(rng);
                let sized = Loan {
                    amount: drawn.amount.min(ledger.available),
                    ..drawn
                };
                let loan = sized.transition(LoanEvent::Deploy { year })?;
                ledger.deploy(loan.amount);
                loans.push(loan);
                loans_created += 1;
            }
        }

        portfolio_values[y] = ledger.total();
        capital_metrics.push(ledger.snapshot());
    }

    let split = apply_waterfall(&cash_flows, &WaterfallTerms::from(config));

    let early_repayment_rate = if loans_created > 0 {
        early_repayments as f64 / loans_created as f64
    } else {
        0.0
    };

    Ok(ProjectionOutput {
        cash_flows,
        portfolio_values,
        lp_cash_flows: split.lp,
        gp_cash_flows: split.gp,
        capital_metrics,
        revenue_streams: split.revenue,
        early_repayment_rate,
        loans_created,
        early_repayments,
        defaults,
        undeployed_capital,
        loans,
    })
}
