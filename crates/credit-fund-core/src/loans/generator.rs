use rand::Rng;

use crate::config::{FundConfig, FundRates, Geography, Zone};
use crate::sampling::{gaussian_noise, Categorical};
use crate::types::{Money, Years};
use crate::CreditFundResult;

use super::loan::{Loan, LoanState};
use super::returns::loan_returns;

/// Smallest loan the fund will write.
pub const MIN_LOAN_AMOUNT: Money = 100_000.0;
/// Bounds on sampled loan terms.
pub const MIN_TERM_YEARS: Years = 0.5;
pub const MAX_TERM_YEARS: Years = 10.0;

/// Samples loans consistent with a configuration's size, term and allocation
/// targets. Built once per configuration and reused for every draw.
#[derive(Debug, Clone)]
pub struct LoanGenerator {
    rates: FundRates,
    loan_count: usize,
    average_loan_size: Money,
    avg_term_length: Years,
    zones: Categorical<Zone>,
    geographies: Categorical<Geography>,
}

impl LoanGenerator {
    pub fn new(config: &FundConfig) -> CreditFundResult<Self> {
        Ok(LoanGenerator {
            rates: config.rates(),
            loan_count: config.loan_count(),
            average_loan_size: config.average_loan_size(),
            avg_term_length: config.avg_term_length,
            zones: Categorical::new(config.zone_allocation.iter().map(|(z, w)| (*z, *w)))?,
            geographies: Categorical::new(
                config.geography_allocation.iter().map(|(g, w)| (*g, *w)),
            )?,
        })
    }

    pub fn average_loan_size(&self) -> Money {
        self.average_loan_size
    }

    /// Draw one pending loan.
    pub fn generate_loan<R: Rng + ?Sized>(&self, rng: &mut R) -> Loan {
        let volatility = self.rates.volatility;

        let amount = (self.average_loan_size * (1.0 + gaussian_noise(rng, volatility)))
            .max(MIN_LOAN_AMOUNT);
        let term_years = (self.avg_term_length * (1.0 + gaussian_noise(rng, volatility / 2.0)))
            .clamp(MIN_TERM_YEARS, MAX_TERM_YEARS);

        let zone = self.zones.sample(rng);
        let geography = self.geographies.sample(rng);

        let expected = loan_returns(&self.rates, amount, term_years, zone, geography, rng);

        Loan {
            amount,
            term_years,
            total_return: expected.total_return,
            annual_return_rate: expected.annual_return_rate,
            zone,
            geography,
            start_year: 0,
            state: LoanState::Pending,
        }
    }

    /// Draw a full portfolio: `max(10, floor(fund / 1M))` pending loans in
    /// generation order.
    pub fn generate_portfolio<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Loan> {
        (0..self.loan_count).map(|_| self.generate_loan(rng)).collect()
    }
}

/// Generate a loan portfolio for `config`.
pub fn generate_portfolio<R: Rng + ?Sized>(
    config: &FundConfig,
    rng: &mut R,
) -> CreditFundResult<Vec<Loan>> {
    Ok(LoanGenerator::new(config)?.generate_portfolio(rng))
}
