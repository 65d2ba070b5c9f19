//! Expiry payoff of a strategy across a price grid.

use crate::types::{LegParameters, OptionType, PayoffPoint, StrategyParameters};
use crate::utils::is_usable_price;

fn call_value(s: f64, k: f64) -> f64 {
    (s - k).max(0.0)
}

fn put_value(s: f64, k: f64) -> f64 {
    (k - s).max(0.0)
}

/// Profit or loss in dollars at expiry with the underlying at `price`.
pub fn payoff_at(params: &StrategyParameters, price: f64) -> f64 {
    let s = price;
    let per_share = match params.legs {
        LegParameters::LongCall { strike, premium } => call_value(s, strike) - premium,
        LegParameters::LongPut { strike, premium } => put_value(s, strike) - premium,
        LegParameters::Vertical {
            option_type,
            long_strike,
            short_strike,
            ..
        } => {
            let intrinsic = match option_type {
                OptionType::Call => {
                    call_value(s, long_strike) - call_value(s, short_strike)
                }
                OptionType::Put => {
                    put_value(s, long_strike) - put_value(s, short_strike)
                }
            };
            intrinsic - params.legs.net_debit()
        }
        LegParameters::Ratio {
            long_strike,
            short_strike,
            short_ratio,
            ..
        } => {
            call_value(s, long_strike) - short_ratio as f64 * call_value(s, short_strike)
                - params.legs.net_debit()
        }
        LegParameters::ShortPut { strike, premium } => premium - put_value(s, strike),
        LegParameters::ShortCall { strike, premium } => premium - call_value(s, strike),
        LegParameters::Iron {
            long_put,
            short_put,
            short_call,
            long_call,
            ..
        } => {
            put_value(s, long_put) - put_value(s, short_put) - call_value(s, short_call)
                + call_value(s, long_call)
                - params.legs.net_debit()
        }
        LegParameters::ShortStraddle { strike, premium } => {
            premium - call_value(s, strike) - put_value(s, strike)
        }
    };
    per_share * params.multiplier()
}

#[derive(Debug, Clone, Copy)]
struct Grid {
    from: f64,
    to: f64,
    steps: usize,
}

/// Evenly spaced payoff samples. Iterating does not consume the curve.
#[derive(Debug, Clone)]
pub struct PayoffCurve {
    params: StrategyParameters,
    grid: Option<Grid>,
}

impl PayoffCurve {
    pub fn iter(&self) -> impl Iterator<Item = PayoffPoint> + '_ {
        let grid = self.grid;
        let n = grid.map_or(0, |g| g.steps + 1);
        (0..n).filter_map(move |i| {
            let g = grid?;
            let price = if g.steps == 0 {
                g.from
            } else {
                g.from + (g.to - g.from) * i as f64 / g.steps as f64
            };
            Some(PayoffPoint {
                price,
                payoff: payoff_at(&self.params, price),
            })
        })
    }

    pub fn len(&self) -> usize {
        self.grid.map_or(0, |g| g.steps + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_vec(&self) -> Vec<PayoffPoint> {
        self.iter().collect()
    }
}

/// Curve over `[from, to]` with `steps + 1` points. Empty when the current
/// price or the bounds are unusable.
pub fn payoff_curve(params: &StrategyParameters, from: f64, to: f64, steps: usize) -> PayoffCurve {
    let usable = is_usable_price(params.current_price)
        && from.is_finite()
        && to.is_finite()
        && from <= to;
    PayoffCurve {
        params: params.clone(),
        grid: usable.then_some(Grid { from, to, steps }),
    }
}

/// Grid settings expressed as fractions of the current price.
#[derive(Debug, Clone, Copy)]
pub struct PayoffEngine {
    pub grid_low: f64,
    pub grid_high: f64,
    pub steps: usize,
}

impl Default for PayoffEngine {
    fn default() -> Self {
        Self {
            grid_low: 0.7,
            grid_high: 1.3,
            steps: 100,
        }
    }
}

impl PayoffEngine {
    pub fn curve(&self, params: &StrategyParameters) -> PayoffCurve {
        let cp = params.current_price;
        payoff_curve(params, cp * self.grid_low, cp * self.grid_high, self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::ParameterSynthesizer;
    use crate::types::{Direction, LegStructure, Timeframe};

    fn params(ls: LegStructure, cp: f64) -> StrategyParameters {
        ParameterSynthesizer::default().synthesize(ls, cp, Timeframe::Short)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn value_at_current_price() {
        let cp = 100.0;
        let expected = [
            (LegStructure::LongCall, -400.0),
            (LegStructure::LongPut, -400.0),
            (LegStructure::BullCallSpread, -200.0),
            (LegStructure::BullCallSpreadWide, -250.0),
            (LegStructure::BearPutSpread, -200.0),
            (LegStructure::CallRatioSpread, -100.0),
            (LegStructure::SellCashSecuredPut, 300.0),
            (LegStructure::SellDeepOtmPut, 200.0),
            (LegStructure::SellCoveredCall, 300.0),
            (LegStructure::IronCondor, 300.0),
            (LegStructure::IronButterfly, 250.0),
            (LegStructure::ShortStraddle, 800.0),
        ];
        for (ls, want) in expected {
            let got = payoff_at(&params(ls, cp), cp);
            assert!(close(got, want), "{}: {} != {}", ls, got, want);
        }
    }

    #[test]
    fn bull_call_spread_is_capped_both_ways() {
        let p = params(LegStructure::BullCallSpread, 100.0);
        assert!(close(payoff_at(&p, 50.0), -200.0));
        assert!(close(payoff_at(&p, 110.0), 800.0));
        assert!(close(payoff_at(&p, 500.0), 800.0));
        assert!(close(payoff_at(&p, 102.0), 0.0));
    }

    #[test]
    fn ratio_spread_loses_on_a_runaway_rally() {
        let p = params(LegStructure::CallRatioSpread, 100.0);
        assert!(close(payoff_at(&p, 110.0), 900.0));
        assert!(payoff_at(&p, 130.0) < 0.0);
    }

    #[test]
    fn bearish_structures_gain_as_the_underlying_falls() {
        let cp = 250.0;
        for ls in LegStructure::ALL {
            if ls.bias() != Direction::Bearish {
                continue;
            }
            let p = params(ls, cp);
            let down = payoff_at(&p, cp * 0.7);
            let up = payoff_at(&p, cp * 1.3);
            assert!(down >= up, "{}: {} at -30% vs {} at +30%", ls, down, up);
        }
    }

    #[test]
    fn short_call_keeps_the_credit_below_the_strike() {
        let p = params(LegStructure::SellCoveredCall, 100.0);
        assert!(close(payoff_at(&p, 60.0), 300.0));
        assert!(close(payoff_at(&p, 110.0), 300.0));
        assert!(close(payoff_at(&p, 113.0), 0.0));
        assert!(close(payoff_at(&p, 150.0), -3700.0));
    }

    #[test]
    fn curve_has_steps_plus_one_points_and_restarts() {
        let p = params(LegStructure::IronCondor, 200.0);
        let curve = PayoffEngine::default().curve(&p);
        let first: Vec<_> = curve.iter().collect();
        let second: Vec<_> = curve.iter().collect();
        assert_eq!(first.len(), 101);
        assert_eq!(first, second);
        assert!(close(first[0].price, 140.0));
        assert!(close(first[100].price, 260.0));
        assert!(first.windows(2).all(|w| w[0].price < w[1].price));
    }

    #[test]
    fn unusable_price_gives_empty_curve() {
        let mut p = params(LegStructure::LongCall, 100.0);
        p.current_price = 0.0;
        let curve = PayoffEngine::default().curve(&p);
        assert!(curve.is_empty());
        assert_eq!(curve.iter().count(), 0);
    }
}
