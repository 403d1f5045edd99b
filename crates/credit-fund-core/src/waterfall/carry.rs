//! Performance-fee (carry) accrual policies.
//!
//! Each policy returns the carry charged at every index of the series. The
//! deal-by-deal policies recompute the excess over the hurdle from the running
//! cumulative distribution each year and do not net out carry already charged
//! in earlier years, so a run of positive years can be charged more than once
//! on the same distributions. This mirrors the fund documents as modelled and
//! is awaiting product-owner confirmation; do not change it silently.

use crate::config::WaterfallType;
use crate::types::Money;

use super::engine::WaterfallTerms;

/// Common interface of the three carry policies.
pub trait CarryPolicy: Sync {
    /// Carry charged at each index of `cash_flows`.
    fn charges(&self, cash_flows: &[Money], terms: &WaterfallTerms) -> Vec<Money>;
}

/// Whole-of-fund carry charged once at the final index.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuropeanCarry;

/// Deal-by-deal carry charged in every year with a positive distribution.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmericanCarry;

/// European accrual through `time_horizon / 2`, charged at that midpoint,
/// then American accrual for the remaining years.
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridCarry;

impl WaterfallType {
    pub fn policy(self) -> &'static dyn CarryPolicy {
        match self {
            WaterfallType::European => &EuropeanCarry,
            WaterfallType::American => &AmericanCarry,
            WaterfallType::Hybrid => &HybridCarry,
        }
    }
}

/// `max(0, distributed - invested * (1 + hurdle)^years) * carry_rate`
fn carry_on(distributed: Money, invested: Money, years: u32, terms: &WaterfallTerms) -> Money {
    let hurdle = invested * (1.0 + terms.hurdle_rate).powi(years as i32);
    (distributed - hurdle).max(0.0) * terms.performance_fee
}

/// Apply the per-year deal-by-deal formula over `years`, starting from a
/// running cumulative distribution.
fn deal_by_deal(
    cash_flows: &[Money],
    years: std::ops::Range<usize>,
    mut cumulative: Money,
    terms: &WaterfallTerms,
    charges: &mut [Money],
) {
    let invested = cash_flows[0].abs();
    for year in years {
        let cf = cash_flows[year];
        if cf > 0.0 {
            cumulative += cf;
            charges[year] = carry_on(cumulative, invested, year as u32, terms);
        }
    }
}

impl CarryPolicy for EuropeanCarry {
    fn charges(&self, cash_flows: &[Money], terms: &WaterfallTerms) -> Vec<Money> {
        let mut charges = vec![0.0; cash_flows.len()];
        if cash_flows.len() < 2 {
            return charges;
        }
        let distributed: Money = cash_flows[1..].iter().filter(|cf| **cf > 0.0).sum();
        let invested = cash_flows[0].abs();
        let last = cash_flows.len() - 1;
        charges[last] = carry_on(distributed, invested, terms.time_horizon, terms);
        charges
    }
}

impl CarryPolicy for AmericanCarry {
    fn charges(&self, cash_flows: &[Money], terms: &WaterfallTerms) -> Vec<Money> {
        let mut charges = vec![0.0; cash_flows.len()];
        if cash_flows.len() < 2 {
            return charges;
        }
        deal_by_deal(cash_flows, 1..cash_flows.len(), 0.0, terms, &mut charges);
        charges
    }
}

impl CarryPolicy for HybridCarry {
    fn charges(&self, cash_flows: &[Money], terms: &WaterfallTerms) -> Vec<Money> {
        let mut charges = vec![0.0; cash_flows.len()];
        if cash_flows.len() < 2 {
            return charges;
        }
        let midpoint = (terms.time_horizon / 2) as usize;
        let invested = cash_flows[0].abs();

        let accrual_end = (midpoint + 1).min(cash_flows.len());
        let cumulative: Money = cash_flows[1..accrual_end]
            .iter()
            .filter(|cf| **cf > 0.0)
            .sum();
        if midpoint < cash_flows.len() {
            charges[midpoint] = carry_on(cumulative, invested, midpoint as u32, terms);
        }

        deal_by_deal(cash_flows, accrual_end..cash_flows.len(), cumulative, terms, &mut charges);
        charges
    }
}
