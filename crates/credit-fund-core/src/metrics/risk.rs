use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

use super::stats::{mean, percentile_sorted, sample_variance, sanitize, sorted};

/// Default annual risk-free rate for the Sharpe ratio.
pub const RISK_FREE_RATE: Rate = 0.02;
/// Default VaR confidence level.
pub const VAR_CONFIDENCE: f64 = 0.95;

/// `(mean(returns) - risk_free) / sample_std_dev(returns)`.
///
/// Returns 0.0 with fewer than two observations or zero variance.
pub fn sharpe_ratio(returns: &[Rate], risk_free_rate: Rate) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std_dev = sample_variance(returns).sqrt();
    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }
    (mean(returns) - risk_free_rate) / std_dev
}

/// Largest `(peak - cumulative) / peak` over the running cumulative sum of
/// `cash_flows`. Points where the running peak is zero contribute nothing.
pub fn max_drawdown(cash_flows: &[Money]) -> Rate {
    if cash_flows.len() < 2 {
        return 0.0;
    }
    let mut cumulative = 0.0;
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = f64::NEG_INFINITY;
    for cf in cash_flows {
        cumulative += cf;
        peak = peak.max(cumulative);
        let dd = if peak == 0.0 {
            0.0
        } else {
            (peak - cumulative) / peak
        };
        max_dd = max_dd.max(dd);
    }
    sanitize(max_dd)
}

/// Lower-tail quantile of `returns` at `confidence`, signed (a loss is
/// negative). 0.0 with fewer than two observations.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    percentile_sorted(&sorted(returns), 100.0 * (1.0 - confidence))
}

/// Pearson correlation; 0.0 for mismatched, short or zero-variance input.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return 0.0;
    }
    let mx = mean(x);
    let my = mean(y);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        vx += (a - mx).powi(2);
        vy += (b - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return 0.0;
    }
    sanitize(cov / (vx.sqrt() * vy.sqrt()))
}

/// Cross-trial correlations between return metrics and a risk proxy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlations {
    pub irr_equity_multiple: f64,
    pub irr_risk: f64,
    pub equity_multiple_risk: f64,
}

/// Correlate IRR, equity multiple and risk, where risk is proxied by the
/// negated final value (a lower final value is a riskier outcome).
pub fn correlations(irr_values: &[f64], equity_multiples: &[f64], final_values: &[f64]) -> Correlations {
    if irr_values.len() < 2 {
        return Correlations::default();
    }
    let risk_proxy: Vec<f64> = final_values.iter().map(|v| -v).collect();
    Correlations {
        irr_equity_multiple: pearson(irr_values, equity_multiples),
        irr_risk: pearson(irr_values, &risk_proxy),
        equity_multiple_risk: pearson(equity_multiples, &risk_proxy),
    }
}
