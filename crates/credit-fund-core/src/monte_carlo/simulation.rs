use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::FundConfig;
use crate::error::CreditFundError;
use crate::loans::generate_portfolio;
use crate::metrics::risk::VAR_CONFIDENCE;
use crate::metrics::stats::{mean, mean_series};
use crate::metrics::{
    correlations, irr, sanitize, value_at_risk, Correlations, MeanStat, SummaryStats,
};
use crate::projection::CapitalMetrics;
use crate::sampling::fund_rng;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::waterfall::{apply_waterfall, RevenueStreams, WaterfallTerms};
use crate::CreditFundResult;

use super::trial::{run_trial, TrialOutcome};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Value-at-risk summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskStats {
    /// 95% VaR of net distributions after year 0
    #[serde(rename = "var95")]
    pub var_95: Money,
}

/// Cross-trial statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStatistics {
    pub final_value: SummaryStats,
    pub irr: SummaryStats,
    pub gp_irr: SummaryStats,
    pub equity_multiple: SummaryStats,
    pub sharpe_ratio: MeanStat,
    pub max_drawdown: MeanStat,
    pub early_repayment_rate: MeanStat,
    pub correlation: Correlations,
    pub risk: RiskStats,
    /// Fee revenue from the mean fund cash-flow series under the base terms.
    /// This approximates, and generally differs from, the mean of per-trial
    /// revenue because carry is non-linear in the cash flows.
    pub revenue_streams: RevenueStreams,
}

/// LP and GP mean cash-flow series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpGpSeries {
    pub lp: Vec<Money>,
    pub gp: Vec<Money>,
}

/// Per-year means across trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    /// Mean IRR of the cash flows truncated at years `1..=time_horizon`
    pub irr_by_year: Vec<Rate>,
    pub lp_cash_flows: Vec<Money>,
    pub portfolio_value: Vec<Money>,
    pub cash_flows: LpGpSeries,
    pub capital_metrics: Vec<CapitalMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub statistics: SimulationStatistics,
    pub time_series: TimeSeries,
    /// Fund IRR of every trial, in trial order
    pub raw_irr_samples: Vec<Rate>,
}

// ---------------------------------------------------------------------------
// Progress / cancellation hook
// ---------------------------------------------------------------------------

/// Receives progress from a running simulation and may cancel it.
///
/// Trials can run on several threads at once, so implementations must be
/// `Sync` and `on_trial_complete` may be called concurrently.
pub trait SimulationObserver: Sync {
    fn on_trial_complete(&self, _completed: usize, _total: usize) {}

    /// Checked before each trial starts.
    fn is_cancelled(&self) -> bool {
        false
    }
}

struct NoopObserver;

impl SimulationObserver for NoopObserver {}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run the Monte Carlo fund simulation.
///
/// A single base portfolio is drawn from the configuration; every trial
/// then projects a private copy of it under independently perturbed market
/// rates. With `seed` set the result is fully reproducible, whether or not
/// trials run in parallel.
pub fn run_simulation(config: &FundConfig) -> CreditFundResult<ComputationOutput<SimulationResult>> {
    run_simulation_with_observer(config, &NoopObserver)
}

/// [`run_simulation`] with progress reporting and cancellation.
pub fn run_simulation_with_observer(
    config: &FundConfig,
    observer: &dyn SimulationObserver,
) -> CreditFundResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    config.validate()?;

    let mut master = fund_rng(config.seed);
    let base_loans = generate_portfolio(config, &mut master)?;
    let total = config.num_simulations as usize;
    let seeds: Vec<u64> = (0..total).map(|_| master.gen()).collect();

    let completed = AtomicUsize::new(0);
    let run_one = |seed: &u64| -> CreditFundResult<TrialOutcome> {
        if observer.is_cancelled() {
            return Err(CreditFundError::Cancelled {
                completed: completed.load(Ordering::Relaxed),
                total,
            });
        }
        let mut rng = fund_rng(Some(*seed));
        let outcome = run_trial(config, &base_loans, &mut rng)?;
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        observer.on_trial_complete(done, total);
        Ok(outcome)
    };

    #[cfg(feature = "parallel")]
    let trials: Vec<TrialOutcome> = seeds
        .par_iter()
        .map(run_one)
        .collect::<CreditFundResult<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let trials: Vec<TrialOutcome> = seeds.iter().map(run_one).collect::<CreditFundResult<_>>()?;

    let result = aggregate(config, &trials);

    // --- Diagnostics ---
    let undetermined = trials.iter().filter(|t| !t.irr_determined).count();
    if undetermined > 0 {
        warnings.push(format!(
            "IRR undetermined for {undetermined} of {total} trials; reported as 0.0"
        ));
    }
    let undeployed = mean(&collect(&trials, |t| t.projection.undeployed_capital));
    if undeployed > 0.0 {
        warnings.push(format!(
            "Mean of {undeployed:.0} left undeployed after the initial deployment period"
        ));
    }
    if total == 1 {
        warnings.push(
            "Single trial: median, min and max equal the mean and correlations are zero".into(),
        );
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monte Carlo private credit fund simulation",
        config,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

fn collect<F: Fn(&TrialOutcome) -> f64>(trials: &[TrialOutcome], f: F) -> Vec<f64> {
    trials.iter().map(f).collect()
}

fn mean_capital_metrics(trials: &[TrialOutcome], len: usize) -> Vec<CapitalMetrics> {
    (0..len)
        .map(|year| {
            let at_year: Vec<&CapitalMetrics> = trials
                .iter()
                .filter_map(|t| t.projection.capital_metrics.get(year))
                .collect();
            let avg = |f: fn(&CapitalMetrics) -> f64| {
                sanitize(mean(&at_year.iter().map(|m| f(m)).collect::<Vec<_>>()))
            };
            CapitalMetrics {
                invested: avg(|m| m.invested),
                available: avg(|m| m.available),
                total: avg(|m| m.total),
            }
        })
        .collect()
}

fn irr_by_year(trials: &[TrialOutcome], time_horizon: u32) -> Vec<Rate> {
    (1..=time_horizon as usize)
        .map(|year| {
            let irrs: Vec<f64> = trials
                .iter()
                .map(|t| {
                    let cfs = &t.projection.cash_flows;
                    irr(&cfs[..=year.min(cfs.len().saturating_sub(1))])
                })
                .collect();
            sanitize(mean(&irrs))
        })
        .collect()
}

fn sanitize_revenue(revenue: RevenueStreams) -> RevenueStreams {
    RevenueStreams {
        management_fee: sanitize(revenue.management_fee),
        upfront_fee: sanitize(revenue.upfront_fee),
        performance_fee: sanitize(revenue.performance_fee),
        total: sanitize(revenue.total),
    }
}

/// Reduce completed trials to the published statistics and time series.
pub fn aggregate(config: &FundConfig, trials: &[TrialOutcome]) -> SimulationResult {
    let irr_values = collect(trials, |t| sanitize(t.irr));
    let equity_multiples = collect(trials, |t| sanitize(t.equity_multiple));
    let final_values = collect(trials, |t| sanitize(t.final_value));
    let net_distributions = collect(trials, |t| sanitize(t.net_distributions));

    let cash_flows: Vec<Vec<f64>> = trials.iter().map(|t| t.projection.cash_flows.clone()).collect();
    let mean_cash_flows = mean_series(&cash_flows);
    let lp: Vec<Vec<f64>> = trials.iter().map(|t| t.projection.lp_cash_flows.clone()).collect();
    let gp: Vec<Vec<f64>> = trials.iter().map(|t| t.projection.gp_cash_flows.clone()).collect();
    let values: Vec<Vec<f64>> = trials.iter().map(|t| t.projection.portfolio_values.clone()).collect();
    let mean_lp = mean_series(&lp);

    let revenue = apply_waterfall(&mean_cash_flows, &WaterfallTerms::from(config)).revenue;

    let statistics = SimulationStatistics {
        final_value: SummaryStats::from_samples(&final_values),
        irr: SummaryStats::from_samples(&irr_values),
        gp_irr: SummaryStats::from_samples(&collect(trials, |t| sanitize(t.gp_irr))),
        equity_multiple: SummaryStats::from_samples(&equity_multiples),
        sharpe_ratio: MeanStat::from_samples(&collect(trials, |t| t.sharpe_ratio)),
        max_drawdown: MeanStat::from_samples(&collect(trials, |t| t.max_drawdown)),
        early_repayment_rate: MeanStat::from_samples(&collect(trials, |t| {
            t.projection.early_repayment_rate
        })),
        correlation: correlations(&irr_values, &equity_multiples, &final_values),
        risk: RiskStats {
            var_95: sanitize(value_at_risk(&net_distributions, VAR_CONFIDENCE)),
        },
        revenue_streams: sanitize_revenue(revenue),
    };

    let time_series = TimeSeries {
        irr_by_year: irr_by_year(trials, config.time_horizon),
        lp_cash_flows: mean_lp.clone(),
        portfolio_value: mean_series(&values),
        cash_flows: LpGpSeries {
            lp: mean_lp,
            gp: mean_series(&gp),
        },
        capital_metrics: mean_capital_metrics(trials, config.time_horizon as usize + 1),
    };

    SimulationResult {
        statistics,
        time_series,
        raw_irr_samples: irr_values,
    }
}
