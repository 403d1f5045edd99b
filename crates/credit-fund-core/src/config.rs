//! Fund configuration: the immutable input record for every simulation.
//!
//! Rate-like fields are supplied in percent (`5.0` = 5%) to match how fund
//! terms are quoted; [`FundConfig::rates`] converts them once into decimal
//! [`FundRates`] before any calculation runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CreditFundError;
use crate::types::{Money, Rate, Years};
use crate::CreditFundResult;

/// Tolerance on allocation sums (percentage points).
const ALLOCATION_TOLERANCE: f64 = 0.01;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Fee-accrual policy for the performance fee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterfallType {
    /// Whole-of-fund carry, charged once at the end of the fund life.
    #[default]
    European,
    /// Deal-by-deal carry, charged every year with a positive distribution.
    American,
    /// European up to the fund midpoint, American afterwards.
    Hybrid,
}

/// Property risk zone of a loan's collateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Green,
    Orange,
    Red,
}

impl Zone {
    /// Multiplier applied to the base default rate.
    pub fn default_multiplier(self) -> f64 {
        match self {
            Zone::Green => 0.5,
            Zone::Orange => 1.0,
            Zone::Red => 1.5,
        }
    }
}

/// Location of a loan's collateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geography {
    Sydney,
    Melbourne,
    Brisbane,
}

impl Geography {
    /// Multiplier applied to the base interest rate.
    pub fn interest_multiplier(self) -> f64 {
        match self {
            Geography::Sydney => 1.0,
            Geography::Melbourne => 1.1,
            Geography::Brisbane => 1.2,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Fund terms, portfolio mix and simulation controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FundConfig {
    /// Committed fund size
    pub initial_investment: Money,
    /// Annual interest rate (%)
    pub interest_rate: f64,
    /// Annual property appreciation (%)
    pub property_appreciation: f64,
    /// Annual default probability (%)
    pub default_rate: f64,
    /// Share of yearly proceeds recycled into new loans (%)
    pub reinvestment_rate: f64,
    /// Loan-to-value ratio (%)
    pub target_ltv: f64,
    /// Average loan term
    pub avg_term_length: Years,
    /// Years over which the commitment is deployed
    pub initial_deployment_period: Years,
    /// Last year in which proceeds may be recycled
    pub last_reinvestment_year: Years,
    /// Annual management fee on AUM (%)
    pub management_fee: f64,
    /// Carry on profits above the hurdle (%)
    pub performance_fee: f64,
    /// Hurdle rate (%)
    pub hurdle_rate: f64,
    /// Origination fee (%)
    pub upfront_fee: f64,
    /// Fund life in whole years
    pub time_horizon: u32,
    /// Relative standard deviation of stochastic inputs (%)
    pub volatility: f64,
    /// Number of Monte Carlo trials
    pub num_simulations: u32,
    /// Annual early repayment probability (%)
    pub early_repayment_rate: f64,
    pub waterfall_type: WaterfallType,
    /// Target zone weights (%), summing to 100
    pub zone_allocation: BTreeMap<Zone, f64>,
    /// Target geography weights (%), summing to 100
    pub geography_allocation: BTreeMap<Geography, f64>,
    /// Optional seed for reproducibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for FundConfig {
    fn default() -> Self {
        FundConfig {
            initial_investment: 50_000_000.0,
            interest_rate: 5.0,
            property_appreciation: 3.0,
            default_rate: 1.0,
            reinvestment_rate: 70.0,
            target_ltv: 60.0,
            avg_term_length: 2.0,
            initial_deployment_period: 3.0,
            last_reinvestment_year: 7.0,
            management_fee: 2.0,
            performance_fee: 20.0,
            hurdle_rate: 8.0,
            upfront_fee: 3.0,
            time_horizon: 10,
            volatility: 2.0,
            num_simulations: 1000,
            early_repayment_rate: 15.0,
            waterfall_type: WaterfallType::European,
            zone_allocation: BTreeMap::from([
                (Zone::Green, 60.0),
                (Zone::Orange, 30.0),
                (Zone::Red, 10.0),
            ]),
            geography_allocation: BTreeMap::from([
                (Geography::Sydney, 70.0),
                (Geography::Melbourne, 20.0),
                (Geography::Brisbane, 10.0),
            ]),
            seed: None,
        }
    }
}

/// Decimal view of the percent-denominated configuration fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundRates {
    pub interest_rate: Rate,
    pub property_appreciation: Rate,
    pub default_rate: Rate,
    pub reinvestment_rate: Rate,
    pub target_ltv: Rate,
    pub management_fee: Rate,
    pub performance_fee: Rate,
    pub hurdle_rate: Rate,
    pub upfront_fee: Rate,
    pub volatility: Rate,
    pub early_repayment_rate: Rate,
}

impl FundConfig {
    /// Parse a JSON document (missing fields take their defaults) and validate it.
    pub fn from_json(json: &str) -> CreditFundResult<Self> {
        let config: FundConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Convert percent-denominated fields into decimal rates.
    pub fn rates(&self) -> FundRates {
        FundRates {
            interest_rate: self.interest_rate / 100.0,
            property_appreciation: self.property_appreciation / 100.0,
            default_rate: self.default_rate / 100.0,
            reinvestment_rate: self.reinvestment_rate / 100.0,
            target_ltv: self.target_ltv / 100.0,
            management_fee: self.management_fee / 100.0,
            performance_fee: self.performance_fee / 100.0,
            hurdle_rate: self.hurdle_rate / 100.0,
            upfront_fee: self.upfront_fee / 100.0,
            volatility: self.volatility / 100.0,
            early_repayment_rate: self.early_repayment_rate / 100.0,
        }
    }

    /// Number of loans in a generated portfolio: one per million, at least ten.
    pub fn loan_count(&self) -> usize {
        ((self.initial_investment / 1_000_000.0).floor() as usize).max(10)
    }

    /// Average loan size used for generation and as the reinvestment threshold.
    pub fn average_loan_size(&self) -> Money {
        self.initial_investment / self.loan_count() as f64
    }

    /// Check bounds and allocation invariants, reporting the first violation.
    pub fn validate(&self) -> CreditFundResult<()> {
        if self.initial_investment.is_nan() || self.initial_investment <= 0.0 {
            return Err(invalid("initialInvestment", "Initial investment must be positive"));
        }
        if self.time_horizon == 0 {
            return Err(invalid("timeHorizon", "Time horizon must be positive"));
        }
        if self.num_simulations == 0 {
            return Err(invalid("numSimulations", "Number of simulations must be positive"));
        }
        check_range("reinvestmentRate", self.reinvestment_rate, 0.0, 100.0)?;
        check_range("targetLtv", self.target_ltv, 0.0, 100.0)?;
        if self.target_ltv == 0.0 {
            return Err(invalid("targetLtv", "Target LTV must be greater than zero"));
        }
        check_range("defaultRate", self.default_rate, 0.0, 100.0)?;
        check_range("earlyRepaymentRate", self.early_repayment_rate, 0.0, 100.0)?;
        check_range("managementFee", self.management_fee, 0.0, 10.0)?;
        check_range("performanceFee", self.performance_fee, 0.0, 50.0)?;
        check_range("hurdleRate", self.hurdle_rate, 0.0, 20.0)?;
        check_range("upfrontFee", self.upfront_fee, 0.0, 10.0)?;
        if self.avg_term_length.is_nan() || self.avg_term_length <= 0.0 {
            return Err(invalid("avgTermLength", "Average term length must be positive"));
        }
        if self.initial_deployment_period.is_nan() || self.initial_deployment_period <= 0.0 {
            return Err(invalid(
                "initialDeploymentPeriod",
                "Deployment period must be positive",
            ));
        }
        if self.volatility.is_nan() || self.volatility < 0.0 {
            return Err(invalid("volatility", "Volatility cannot be negative"));
        }
        if self.last_reinvestment_year > f64::from(self.time_horizon) {
            return Err(invalid(
                "lastReinvestmentYear",
                "Last reinvestment year cannot exceed time horizon",
            ));
        }
        check_allocation("zoneAllocation", self.zone_allocation.values().copied())?;
        check_allocation(
            "geographyAllocation",
            self.geography_allocation.values().copied(),
        )?;
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> CreditFundError {
    CreditFundError::InvalidInput {
        field: field.into(),
        reason: reason.into(),
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> CreditFundResult<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CreditFundError::InvalidInput {
            field: field.into(),
            reason: format!("Must be between {min} and {max}, got {value}"),
        })
    }
}

fn check_allocation(field: &str, weights: impl Iterator<Item = f64>) -> CreditFundResult<()> {
    let mut total = 0.0;
    for w in weights {
        check_range(field, w, 0.0, 100.0)?;
        total += w;
    }
    if (total - 100.0).abs() > ALLOCATION_TOLERANCE {
        return Err(CreditFundError::InvalidInput {
            field: field.into(),
            reason: format!("Allocation percentages must sum to 100, got {total}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FundConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rates_are_decimal() {
        let rates = FundConfig::default().rates();
        assert!((rates.interest_rate - 0.05).abs() < 1e-12);
        assert!((rates.target_ltv - 0.60).abs() < 1e-12);
        assert!((rates.reinvestment_rate - 0.70).abs() < 1e-12);
    }

    #[test]
    fn test_loan_count_floor_of_ten() {
        let mut config = FundConfig::default();
        assert_eq!(config.loan_count(), 50);
        assert!((config.average_loan_size() - 1_000_000.0).abs() < 1e-6);

        config.initial_investment = 5_000_000.0;
        assert_eq!(config.loan_count(), 10);
        assert!((config.average_loan_size() - 500_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_zone_allocation_must_sum_to_100() {
        let mut config = FundConfig::default();
        config.zone_allocation.insert(Zone::Red, 20.0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("zoneAllocation"));
    }

    #[test]
    fn test_allocation_tolerance() {
        let mut config = FundConfig::default();
        config.geography_allocation.insert(Geography::Brisbane, 10.005);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_last_reinvestment_year_bound() {
        let config = FundConfig {
            last_reinvestment_year: 11.0,
            ..FundConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("lastReinvestmentYear"));
    }

    #[test]
    fn test_fee_bounds() {
        let config = FundConfig {
            performance_fee: 60.0,
            ..FundConfig::default()
        };
        assert!(config.validate().is_err());

        let config = FundConfig {
            management_fee: -1.0,
            ..FundConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_partial_document() {
        let config = FundConfig::from_json(
            r#"{
                "initialInvestment": 20000000,
                "timeHorizon": 8,
                "lastReinvestmentYear": 5,
                "waterfallType": "hybrid",
                "zoneAllocation": {"green": 50, "orange": 50, "red": 0},
                "seed": 7
            }"#,
        )
        .unwrap();
        assert_eq!(config.time_horizon, 8);
        assert_eq!(config.waterfall_type, WaterfallType::Hybrid);
        assert_eq!(config.zone_allocation[&Zone::Orange], 50.0);
        assert_eq!(config.seed, Some(7));
        // untouched fields keep their defaults
        assert_eq!(config.hurdle_rate, 8.0);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let result = FundConfig::from_json(r#"{"timeHorizon": 0}"#);
        assert!(matches!(
            result,
            Err(CreditFundError::InvalidInput { ref field, .. }) if field == "timeHorizon"
        ));
    }

    #[test]
    fn test_from_json_malformed() {
        let result = FundConfig::from_json(r#"{"waterfallType": "asian"}"#);
        assert!(matches!(result, Err(CreditFundError::SerializationError(_))));
    }
}
