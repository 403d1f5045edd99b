//! Fee schedules that do not depend on the waterfall policy.

use crate::types::Money;

use super::engine::WaterfallTerms;

/// Annual management fee on a simplified AUM: the commitment plus all net
/// cash flows before the year in question. Index 0 carries no fee.
pub fn management_fees(cash_flows: &[Money], terms: &WaterfallTerms) -> Vec<Money> {
    let mut charges = vec![0.0; cash_flows.len()];
    let mut cumulative = 0.0;
    for year in 1..cash_flows.len() {
        cumulative += cash_flows[year - 1];
        let aum = terms.initial_investment + cumulative;
        charges[year] = aum * terms.management_fee;
    }
    charges
}

/// Origination fee on the capital scheduled for deployment in each year of
/// the deployment period (capped to the series length).
pub fn upfront_fees(len: usize, terms: &WaterfallTerms) -> Vec<Money> {
    let mut charges = vec![0.0; len];
    if terms.deployment_period <= 0.0 {
        return charges;
    }
    let deployed_per_year = terms.initial_investment / terms.deployment_period;
    let last = (terms.deployment_period.floor() as usize)
        .saturating_add(1)
        .min(len);
    for charge in charges.iter_mut().take(last).skip(1) {
        *charge = deployed_per_year * terms.upfront_fee;
    }
    charges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaterfallType;

    fn terms() -> WaterfallTerms {
        WaterfallTerms {
            initial_investment: 1000.0,
            management_fee: 0.02,
            upfront_fee: 0.03,
            performance_fee: 0.20,
            hurdle_rate: 0.08,
            deployment_period: 2.0,
            time_horizon: 4,
            waterfall_type: WaterfallType::European,
        }
    }

    #[test]
    fn test_management_fee_base() {
        let fees = management_fees(&[-1000.0, 100.0, 200.0, 300.0], &terms());
        // AUM: 0, 100, 300
        assert_eq!(fees[0], 0.0);
        assert!((fees[1] - 0.0).abs() < 1e-12);
        assert!((fees[2] - 2.0).abs() < 1e-12);
        assert!((fees[3] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_upfront_fee_window() {
        let fees = upfront_fees(5, &terms());
        let expected = [0.0, 15.0, 15.0, 0.0, 0.0];
        for (fee, want) in fees.iter().zip(expected) {
            assert!((fee - want).abs() < 1e-9, "fee={fee}, want={want}");
        }
    }

    #[test]
    fn test_upfront_fee_capped_to_series() {
        let t = WaterfallTerms {
            deployment_period: 5.0,
            ..terms()
        };
        let fees = upfront_fees(3, &t);
        assert_eq!(fees.len(), 3);
        assert!((fees[2] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_huge_deployment_period_charges_every_year() {
        let t = WaterfallTerms {
            deployment_period: 1e20,
            ..terms()
        };
        let fees = upfront_fees(4, &t);
        assert_eq!(fees[0], 0.0);
        for fee in &fees[1..] {
            assert!(*fee > 0.0 && *fee < 1e-12);
        }
    }

    #[test]
    fn test_fractional_deployment_period() {
        let t = WaterfallTerms {
            deployment_period: 2.5,
            ..terms()
        };
        // years 1 and 2 only, each on 1000 / 2.5
        let fees = upfront_fees(5, &t);
        assert!((fees[1] - 12.0).abs() < 1e-12);
        assert!((fees[2] - 12.0).abs() < 1e-12);
        assert_eq!(fees[3], 0.0);
    }
}
