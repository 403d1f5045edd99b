use crate::error::CreditFundError;
use crate::types::{Money, Multiple, Rate};
use crate::CreditFundResult;

const CONVERGENCE_THRESHOLD: f64 = 1e-7;
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const IRR_GUESS: Rate = 0.10;
/// Open interval of admissible IRR values.
const IRR_LOWER: Rate = -1.0;
const IRR_UPPER: Rate = 100.0;

/// Net Present Value of yearly cash flows (index 0 undiscounted).
pub fn npv(rate: Rate, cash_flows: &[Money]) -> Money {
    let one_plus_r = 1.0 + rate;
    let mut discount = 1.0;
    let mut result = 0.0;
    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        result += cf / discount;
    }
    result
}

/// d(NPV)/dr
fn npv_derivative(rate: Rate, cash_flows: &[Money]) -> f64 {
    let one_plus_r = 1.0 + rate;
    cash_flows
        .iter()
        .enumerate()
        .skip(1)
        .map(|(t, cf)| -(t as f64) * cf / one_plus_r.powi(t as i32 + 1))
        .sum()
}

/// Internal Rate of Return with typed failures.
///
/// Newton-Raphson from 10%, falling back to bisection over (-0.99, 100) when
/// Newton stalls or leaves the domain. Convergence is judged on NPV relative
/// to the gross size of the flows.
pub fn solve_irr(cash_flows: &[Money]) -> CreditFundResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(CreditFundError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    let has_positive = cash_flows.iter().any(|cf| *cf > 0.0);
    let has_negative = cash_flows.iter().any(|cf| *cf < 0.0);
    if !(has_positive && has_negative) {
        return Err(CreditFundError::InsufficientData(
            "IRR requires both positive and negative cash flows".into(),
        ));
    }

    let scale = cash_flows.iter().map(|cf| cf.abs()).sum::<f64>().max(1.0);
    let tolerance = CONVERGENCE_THRESHOLD * scale;

    if let Some(rate) = newton(cash_flows, tolerance) {
        return in_domain(rate);
    }
    let rate = bisection(cash_flows, tolerance)?;
    in_domain(rate)
}

fn newton(cash_flows: &[Money], tolerance: f64) -> Option<Rate> {
    let mut rate = IRR_GUESS;
    for _ in 0..MAX_IRR_ITERATIONS {
        let value = npv(rate, cash_flows);
        if !value.is_finite() {
            return None;
        }
        if value.abs() < tolerance {
            return Some(rate);
        }
        let slope = npv_derivative(rate, cash_flows);
        if slope == 0.0 || !slope.is_finite() {
            return None;
        }
        rate -= value / slope;
        if !rate.is_finite() || rate <= -0.99 || rate >= IRR_UPPER {
            return None;
        }
    }
    None
}

fn bisection(cash_flows: &[Money], tolerance: f64) -> CreditFundResult<Rate> {
    let mut lo = -0.99;
    let mut hi = IRR_UPPER;
    let mut f_lo = npv(lo, cash_flows);
    let f_hi = npv(hi, cash_flows);
    if !f_lo.is_finite() || !f_hi.is_finite() || f_lo.signum() == f_hi.signum() {
        return Err(CreditFundError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: 0,
            last_delta: f_lo,
        });
    }

    let mut f_mid = f_lo;
    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        f_mid = npv(mid, cash_flows);
        if f_mid.abs() < tolerance || (hi - lo) < 1e-12 {
            return Ok(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(CreditFundError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_BISECTION_ITERATIONS,
        last_delta: f_mid,
    })
}

fn in_domain(rate: Rate) -> CreditFundResult<Rate> {
    if rate.is_finite() && rate > IRR_LOWER && rate < IRR_UPPER {
        Ok(rate)
    } else {
        Err(CreditFundError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: MAX_IRR_ITERATIONS,
            last_delta: rate,
        })
    }
}

/// IRR with the 0.0 sentinel for "undetermined": fewer than two flows, flows
/// of a single sign, non-convergence or a root outside (-1, 100). Callers
/// must not read 0.0 as a literal zero return without checking the flows.
pub fn irr(cash_flows: &[Money]) -> Rate {
    solve_irr(cash_flows).unwrap_or(0.0)
}

/// Total positive distributions over total absolute contributions.
///
/// Returns the 1.0 sentinel when there are fewer than two flows or when the
/// series lacks either a contribution or a distribution.
pub fn equity_multiple(cash_flows: &[Money]) -> Multiple {
    if cash_flows.len() < 2 {
        return 1.0;
    }
    let invested: f64 = cash_flows.iter().filter(|cf| **cf < 0.0).map(|cf| cf.abs()).sum();
    let distributed: f64 = cash_flows.iter().filter(|cf| **cf > 0.0).sum();
    if invested == 0.0 || distributed == 0.0 {
        return 1.0;
    }
    distributed / invested
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npv_basic() {
        let cfs = [-1000.0, 300.0, 400.0, 500.0];
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((npv(0.10, &cfs) + 21.04).abs() < 0.01);
    }

    #[test]
    fn test_npv_zero_rate() {
        assert_eq!(npv(0.0, &[-100.0, 50.0, 50.0, 50.0]), 50.0);
    }

    #[test]
    fn test_irr_basic() {
        let r = irr(&[-1000.0, 400.0, 400.0, 400.0]);
        assert!((r - 0.0970).abs() < 0.001, "irr={r}");
    }

    #[test]
    fn test_irr_single_period() {
        let r = irr(&[-100.0, 110.0]);
        assert!((r - 0.10).abs() < 1e-6);
    }

    #[test]
    fn test_irr_negative_return() {
        let r = irr(&[-100.0, 0.0, 50.0]);
        // 50 / 100 = (1+r)^-2 => r = sqrt(0.5) - 1
        assert!((r - (0.5f64.sqrt() - 1.0)).abs() < 1e-6, "irr={r}");
    }

    #[test]
    fn test_irr_sentinels() {
        assert_eq!(irr(&[]), 0.0);
        assert_eq!(irr(&[-100.0]), 0.0);
        assert_eq!(irr(&[100.0, 50.0, 20.0]), 0.0);
        assert_eq!(irr(&[-100.0, -5.0, 0.0]), 0.0);
        assert!(solve_irr(&[0.0, 0.0]).is_err());
    }

    #[test]
    fn test_irr_zero_is_distinguishable() {
        // a genuine 0% IRR converges; the all-positive series is a sentinel
        assert!(solve_irr(&[-100.0, 100.0]).unwrap().abs() < 1e-6);
        assert!(solve_irr(&[100.0, 100.0]).is_err());
    }

    #[test]
    fn test_irr_huge_return_out_of_domain() {
        // 1000x in a year is an IRR of 999, outside (-1, 100)
        assert_eq!(irr(&[-1.0, 1000.0]), 0.0);
    }

    #[test]
    fn test_equity_multiple() {
        assert!((equity_multiple(&[-100.0, 50.0, 100.0]) - 1.5).abs() < 1e-12);
        assert_eq!(equity_multiple(&[-100.0, 0.0, 0.0]), 1.0);
        assert_eq!(equity_multiple(&[10.0, 20.0]), 1.0);
        assert_eq!(equity_multiple(&[-100.0]), 1.0);
    }
}
