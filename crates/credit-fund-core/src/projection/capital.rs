use serde::{Deserialize, Serialize};

use crate::loans::{Loan, LoanEvent, LoanState};
use crate::types::Money;
use crate::CreditFundResult;

/// Capital position at the end of a year. `total == invested + available`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CapitalMetrics {
    pub invested: Money,
    pub available: Money,
    pub total: Money,
}

/// Running split of fund capital between loans and cash.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapitalLedger {
    pub invested: Money,
    pub available: Money,
}

impl CapitalLedger {
    pub fn new(commitment: Money) -> Self {
        CapitalLedger {
            invested: 0.0,
            available: commitment,
        }
    }

    /// Move `amount` of cash into loans.
    pub fn deploy(&mut self, amount: Money) {
        self.invested += amount;
        self.available -= amount;
    }

    /// Add recycled proceeds to available cash.
    pub fn recycle(&mut self, amount: Money) {
        self.available += amount;
    }

    pub fn total(&self) -> Money {
        self.invested + self.available
    }

    pub fn snapshot(&self) -> CapitalMetrics {
        CapitalMetrics {
            invested: self.invested,
            available: self.available,
            total: self.total(),
        }
    }
}

/// Pending loans awaiting initial deployment, held as indices into the
/// trial's loan arena in generation order.
#[derive(Debug, Clone, Default)]
pub struct DeploymentQueue {
    pending: Vec<usize>,
}

impl DeploymentQueue {
    /// Queue every pending loan in `loans`.
    pub fn from_loans(loans: &[Loan]) -> Self {
        DeploymentQueue {
            pending: loans
                .iter()
                .enumerate()
                .filter(|(_, l)| l.state == LoanState::Pending)
                .map(|(i, _)| i)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// First-fit pass for one deployment year.
    ///
    /// Walks the queue in order, activating every loan whose amount still
    /// fits in the remaining `budget`; loans that do not fit stay queued for
    /// later years. The scan stops once the budget is exhausted. Returns the
    /// amount deployed.
    pub fn deploy_year(
        &mut self,
        loans: &mut [Loan],
        year: u32,
        budget: Money,
    ) -> CreditFundResult<Money> {
        let mut deployed = 0.0;
        let mut remaining = Vec::with_capacity(self.pending.len());
        let mut scan = self.pending.iter().copied();

        for idx in scan.by_ref() {
            if deployed >= budget {
                remaining.push(idx);
                break;
            }
            let amount = loans[idx].amount;
            if deployed + amount <= budget {
                loans[idx] = loans[idx].transition(LoanEvent::Deploy { year })?;
                deployed += amount;
            } else {
                remaining.push(idx);
            }
        }
        remaining.extend(scan);

        self.pending = remaining;
        Ok(deployed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Geography, Zone};

    fn loan(amount: Money) -> Loan {
        Loan {
            amount,
            term_years: 2.0,
            total_return: 0.0,
            annual_return_rate: 0.0,
            zone: Zone::Green,
            geography: Geography::Sydney,
            start_year: 0,
            state: LoanState::Pending,
        }
    }

    #[test]
    fn test_ledger_conserves_total() {
        let mut ledger = CapitalLedger::new(100.0);
        ledger.deploy(60.0);
        ledger.recycle(15.0);
        let snap = ledger.snapshot();
        assert_eq!(snap.invested, 60.0);
        assert_eq!(snap.available, 55.0);
        assert_eq!(snap.total, snap.invested + snap.available);
    }

    #[test]
    fn test_first_fit_skips_and_continues() {
        let mut loans = vec![loan(40.0), loan(70.0), loan(50.0), loan(30.0)];
        let mut queue = DeploymentQueue::from_loans(&loans);

        // 40 fits, 70 does not, 50 fits (90), 30 does not (120 > 100)
        let deployed = queue.deploy_year(&mut loans, 1, 100.0).unwrap();
        assert_eq!(deployed, 90.0);
        assert_eq!(loans[0].start_year, 1);
        assert_eq!(loans[1].state, LoanState::Pending);
        assert_eq!(loans[2].start_year, 1);
        assert_eq!(loans[3].state, LoanState::Pending);
        assert_eq!(queue.len(), 2);

        // skipped loans remain eligible the following year
        let deployed = queue.deploy_year(&mut loans, 2, 100.0).unwrap();
        assert_eq!(deployed, 100.0);
        assert_eq!(loans[1].start_year, 2);
        assert_eq!(loans[3].start_year, 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_scan_stops_when_budget_exhausted() {
        let mut loans = vec![loan(50.0), loan(50.0), loan(10.0)];
        let mut queue = DeploymentQueue::from_loans(&loans);
        let deployed = queue.deploy_year(&mut loans, 1, 100.0).unwrap();
        assert_eq!(deployed, 100.0);
        assert_eq!(loans[2].state, LoanState::Pending);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_zero_budget_deploys_nothing() {
        let mut loans = vec![loan(10.0)];
        let mut queue = DeploymentQueue::from_loans(&loans);
        assert_eq!(queue.deploy_year(&mut loans, 1, 0.0).unwrap(), 0.0);
        assert_eq!(queue.len(), 1);
    }
}
