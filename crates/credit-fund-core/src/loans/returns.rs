use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{FundRates, Geography, Zone};
use crate::sampling::gaussian_noise;
use crate::types::{Money, Rate, Years};

/// Expected return of a single loan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanReturn {
    /// Total return over the term, net of expected loss
    pub total_return: Money,
    /// `total_return / amount / term` (0 when the term is zero)
    pub annual_return_rate: Rate,
}

/// Expected total and annualised return of a loan.
///
/// Revenue is the origination fee, simple interest at the geography-adjusted
/// rate, and the lender's LTV share of collateral appreciation. Expected loss
/// uses the zone-adjusted default rate. The total is scaled by
/// `1 + N(0, volatility)`.
///
/// `amount` must be non-zero.
pub fn loan_returns<R: Rng + ?Sized>(
    rates: &FundRates,
    amount: Money,
    term: Years,
    zone: Zone,
    geography: Geography,
    rng: &mut R,
) -> LoanReturn {
    let adjusted_default_rate = rates.default_rate * zone.default_multiplier();
    let adjusted_interest_rate = rates.interest_rate * geography.interest_multiplier();

    let property_value = amount / rates.target_ltv;
    let upfront_fee_revenue = amount * rates.upfront_fee;
    let interest_revenue = amount * adjusted_interest_rate * term;

    let appreciated_value = property_value * (1.0 + rates.property_appreciation).powf(term);
    let appreciation_revenue = (appreciated_value - property_value) * rates.target_ltv;

    let expected_loss = amount * adjusted_default_rate * term;

    let total_return = (upfront_fee_revenue + interest_revenue + appreciation_revenue
        - expected_loss)
        * (1.0 + gaussian_noise(rng, rates.volatility));

    let annual_return_rate = if term > 0.0 {
        total_return / amount / term
    } else {
        0.0
    };

    LoanReturn {
        total_return,
        annual_return_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FundConfig;
    use crate::sampling::fund_rng;

    fn noise_free_rates() -> FundRates {
        FundConfig {
            volatility: 0.0,
            ..FundConfig::default()
        }
        .rates()
    }

    #[test]
    fn test_known_answer_orange_sydney() {
        // 1M over 2y at 5%, 3% upfront, 3% appreciation, 60% LTV, 1% default
        let rates = noise_free_rates();
        let mut rng = fund_rng(Some(1));
        let r = loan_returns(&rates, 1_000_000.0, 2.0, Zone::Orange, Geography::Sydney, &mut rng);

        let upfront = 30_000.0;
        let interest = 100_000.0;
        let property = 1_000_000.0 / 0.6;
        let appreciation = (property * 1.03f64.powi(2) - property) * 0.6;
        let loss = 20_000.0;
        let expected = upfront + interest + appreciation - loss;

        assert!((r.total_return - expected).abs() < 1e-6, "got {}", r.total_return);
        assert!((r.annual_return_rate - expected / 1_000_000.0 / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zone_and_geography_adjustments() {
        let rates = noise_free_rates();
        let mut rng = fund_rng(Some(1));
        let green = loan_returns(&rates, 1e6, 2.0, Zone::Green, Geography::Sydney, &mut rng);
        let red = loan_returns(&rates, 1e6, 2.0, Zone::Red, Geography::Sydney, &mut rng);
        // green loses 0.5% p.a., red 1.5% p.a.
        assert!((green.total_return - red.total_return - 20_000.0).abs() < 1e-6);

        let brisbane = loan_returns(&rates, 1e6, 2.0, Zone::Green, Geography::Brisbane, &mut rng);
        // 20% uplift on 100k of interest
        assert!((brisbane.total_return - green.total_return - 20_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_term_has_zero_annual_rate() {
        let rates = noise_free_rates();
        let mut rng = fund_rng(Some(1));
        let r = loan_returns(&rates, 1e6, 0.0, Zone::Green, Geography::Sydney, &mut rng);
        assert_eq!(r.annual_return_rate, 0.0);
        // only the upfront fee survives a zero term
        assert!((r.total_return - 30_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_volatility_perturbs_total_return() {
        let rates = FundConfig {
            volatility: 10.0,
            ..FundConfig::default()
        }
        .rates();
        let mut rng = fund_rng(Some(3));
        let a = loan_returns(&rates, 1e6, 2.0, Zone::Green, Geography::Sydney, &mut rng);
        let b = loan_returns(&rates, 1e6, 2.0, Zone::Green, Geography::Sydney, &mut rng);
        assert_ne!(a.total_return, b.total_return);
    }
}
