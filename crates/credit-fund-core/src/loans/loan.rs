//! Loan records and their lifecycle.
//!
//! A loan moves `Pending -> Active -> {Defaulted | EarlyRepaid | Matured}`.
//! Transitions are pure: [`Loan::transition`] returns a new record and never
//! mutates the input, so a base portfolio can be shared between trials.

use serde::{Deserialize, Serialize};

use crate::config::{Geography, Zone};
use crate::error::CreditFundError;
use crate::types::{Money, Rate, Years};
use crate::CreditFundResult;

/// Fraction of principal recovered on default.
pub const RECOVERY_RATE: Rate = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoanState {
    Pending,
    Active,
    Defaulted,
    EarlyRepaid,
    Matured,
}

impl LoanState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LoanState::Defaulted | LoanState::EarlyRepaid | LoanState::Matured
        )
    }
}

/// Events driving the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LoanEvent {
    /// Capital is assigned in `year` (initial deployment or reinvestment).
    Deploy { year: u32 },
    Default,
    EarlyRepay,
    Mature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    /// Principal
    pub amount: Money,
    /// Contractual term
    pub term_years: Years,
    /// Expected total return over the term
    pub total_return: Money,
    /// `total_return / amount / term_years`
    pub annual_return_rate: Rate,
    pub zone: Zone,
    pub geography: Geography,
    /// Year of deployment; 0 while undeployed
    pub start_year: u32,
    pub state: LoanState,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.state == LoanState::Active
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whole years elapsed since deployment.
    pub fn years_active(&self, year: u32) -> Years {
        f64::from(year.saturating_sub(self.start_year))
    }

    /// Apply `event`, returning the successor record.
    pub fn transition(&self, event: LoanEvent) -> CreditFundResult<Loan> {
        let next = match (self.state, event) {
            (LoanState::Pending, LoanEvent::Deploy { year }) if year > 0 => Loan {
                start_year: year,
                state: LoanState::Active,
                ..self.clone()
            },
            (LoanState::Active, LoanEvent::Default) => Loan {
                state: LoanState::Defaulted,
                ..self.clone()
            },
            (LoanState::Active, LoanEvent::EarlyRepay) => Loan {
                state: LoanState::EarlyRepaid,
                ..self.clone()
            },
            (LoanState::Active, LoanEvent::Mature) => Loan {
                state: LoanState::Matured,
                ..self.clone()
            },
            (state, event) => {
                return Err(CreditFundError::InvalidTransition(format!(
                    "{event:?} is not valid for a {state:?} loan"
                )))
            }
        };
        Ok(next)
    }

    /// Cash returned to the fund when `event` closes the loan in `year`.
    ///
    /// Defaults recover a fixed share of principal, early repayments earn the
    /// return prorated by time outstanding, maturities earn it in full.
    pub fn settlement(&self, event: LoanEvent, year: u32) -> Money {
        match event {
            LoanEvent::Default => self.amount * RECOVERY_RATE,
            LoanEvent::EarlyRepay => {
                let fraction = if self.term_years > 0.0 {
                    self.years_active(year) / self.term_years
                } else {
                    1.0
                };
                self.amount + self.total_return * fraction
            }
            LoanEvent::Mature => self.amount + self.total_return,
            LoanEvent::Deploy { .. } => 0.0,
        }
    }
}
