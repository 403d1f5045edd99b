use serde::{Deserialize, Serialize};

use crate::config::{FundConfig, WaterfallType};
use crate::types::{Money, Rate, Years};

use super::fees::{management_fees, upfront_fees};

/// Fund terms consumed by the waterfall, in decimal form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterfallTerms {
    pub initial_investment: Money,
    pub management_fee: Rate,
    pub upfront_fee: Rate,
    pub performance_fee: Rate,
    pub hurdle_rate: Rate,
    pub deployment_period: Years,
    pub time_horizon: u32,
    pub waterfall_type: WaterfallType,
}

impl From<&FundConfig> for WaterfallTerms {
    fn from(config: &FundConfig) -> Self {
        let rates = config.rates();
        WaterfallTerms {
            initial_investment: config.initial_investment,
            management_fee: rates.management_fee,
            upfront_fee: rates.upfront_fee,
            performance_fee: rates.performance_fee,
            hurdle_rate: rates.hurdle_rate,
            deployment_period: config.initial_deployment_period,
            time_horizon: config.time_horizon,
            waterfall_type: config.waterfall_type,
        }
    }
}

/// GP fee revenue by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueStreams {
    pub management_fee: Money,
    pub upfront_fee: Money,
    pub performance_fee: Money,
    pub total: Money,
}

/// LP/GP split of a fund cash-flow series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallSplit {
    pub lp: Vec<Money>,
    pub gp: Vec<Money>,
    pub revenue: RevenueStreams,
}

/// Split a fund cash-flow series between LPs and the GP.
///
/// Management, upfront and performance fees are moved from the LP series to
/// the GP series index by index, so `lp[t] + gp[t] == cash_flows[t]` holds
/// throughout. The carry policy is selected by `terms.waterfall_type`.
pub fn apply_waterfall(cash_flows: &[Money], terms: &WaterfallTerms) -> WaterfallSplit {
    let management = management_fees(cash_flows, terms);
    let upfront = upfront_fees(cash_flows.len(), terms);
    let performance = terms.waterfall_type.policy().charges(cash_flows, terms);

    let mut lp = cash_flows.to_vec();
    let mut gp = vec![0.0; cash_flows.len()];
    for t in 0..cash_flows.len() {
        let fee = management[t] + upfront[t] + performance[t];
        gp[t] += fee;
        lp[t] -= fee;
    }

    let management_fee: Money = management.iter().sum();
    let upfront_fee: Money = upfront.iter().sum();
    let performance_fee: Money = performance.iter().sum();

    WaterfallSplit {
        lp,
        gp,
        revenue: RevenueStreams {
            management_fee,
            upfront_fee,
            performance_fee,
            total: management_fee + upfront_fee + performance_fee,
        },
    }
}
