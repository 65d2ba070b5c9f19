//! Closed-form max loss, max gain and breakevens per leg shape.

use crate::types::{LegParameters, OptionType, ProfitBound, StrategyMetrics, StrategyParameters};

const LABEL_LOW: &str = "low (~35%)";
const LABEL_MODERATE: &str = "moderate (~45%)";
const LABEL_EVEN: &str = "even (~50%)";
const LABEL_MODERATE_HIGH: &str = "moderate-high (~60%)";
const LABEL_HIGH: &str = "high (~70%)";

fn loss(x: f64) -> ProfitBound {
    ProfitBound::Finite(x.min(0.0))
}

fn gain(x: f64) -> ProfitBound {
    ProfitBound::Finite(x.max(0.0))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RiskMetricsCalculator;

impl RiskMetricsCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Probability labels are fixed qualitative strings, not statistics.
    pub fn metrics(&self, params: &StrategyParameters) -> StrategyMetrics {
        let m = params.multiplier();
        let net = params.legs.net_debit();
        let width = params.legs.strike_width().unwrap_or(0.0);

        let (max_loss, max_gain, breakeven, upper_breakeven, label) = match params.legs {
            LegParameters::LongCall { strike, premium } => (
                loss(-premium * m),
                ProfitBound::Unbounded,
                strike + premium,
                None,
                LABEL_LOW,
            ),
            LegParameters::LongPut { strike, premium } => (
                loss(-premium * m),
                gain((strike - premium) * m),
                strike - premium,
                None,
                LABEL_LOW,
            ),
            LegParameters::Vertical {
                option_type,
                long_strike,
                ..
            } => {
                let be = match option_type {
                    OptionType::Call => long_strike + net,
                    OptionType::Put => long_strike - net,
                };
                (
                    loss(-net * m),
                    gain((width - net) * m),
                    be,
                    None,
                    LABEL_MODERATE,
                )
            }
            LegParameters::Ratio {
                long_strike,
                short_strike,
                ..
            } => {
                let upper = short_strike + width - net;
                let (be, ube) = if net > 0.0 {
                    (long_strike + net, Some(upper))
                } else {
                    (upper, None)
                };
                (
                    ProfitBound::Unbounded,
                    gain((width - net) * m),
                    be,
                    ube,
                    LABEL_MODERATE,
                )
            }
            LegParameters::ShortPut { strike, premium } => (
                loss(-(strike - premium) * m),
                gain(premium * m),
                strike - premium,
                None,
                LABEL_HIGH,
            ),
            LegParameters::ShortCall { strike, premium } => (
                ProfitBound::Unbounded,
                gain(premium * m),
                strike + premium,
                None,
                LABEL_HIGH,
            ),
            LegParameters::Iron {
                short_put,
                short_call,
                ..
            } => {
                let credit = -net;
                (
                    loss(-(width - credit) * m),
                    gain(credit * m),
                    short_put - credit,
                    Some(short_call + credit),
                    LABEL_MODERATE_HIGH,
                )
            }
            LegParameters::ShortStraddle { strike, premium } => (
                ProfitBound::Unbounded,
                gain(premium * m),
                strike - premium,
                Some(strike + premium),
                LABEL_EVEN,
            ),
        };

        StrategyMetrics {
            max_loss,
            max_gain,
            breakeven,
            upper_breakeven,
            probability_label: label.to_string(),
        }
    }
}
