//! Strategy parameters: bound to a real chain contract when one qualifies,
//! otherwise synthesized from fixed percentage offsets of the spot price.

use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use crate::chain::ChainDataProvider;
use crate::types::{
    BoundOptionLeg, DataSource, LegParameters, LegStructure, OptionType, StrategyParameters,
    Timeframe, CONTRACT_MULTIPLIER,
};
use crate::utils::{days_between, is_usable_price};

/// How far a chain contract may sit from the requested expiry and spot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindWindow {
    pub expiry_days: i64,
    pub strike_pct: f64,
}

impl Default for BindWindow {
    fn default() -> Self {
        Self {
            expiry_days: 30,
            strike_pct: 0.20,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ParameterSynthesizer {
    window: BindWindow,
    /// Capital the position is sized from. `None` trades a single contract.
    notional: Option<f64>,
}

impl ParameterSynthesizer {
    pub fn new(window: BindWindow) -> Self {
        Self {
            window,
            notional: None,
        }
    }

    pub fn with_notional(mut self, notional: f64) -> Self {
        self.notional = Some(notional);
        self
    }

    /// Whole contracts the notional buys at spot, never fewer than one.
    pub fn contracts_for(&self, current_price: f64) -> u32 {
        let Some(notional) = self.notional else {
            return 1;
        };
        if !notional.is_finite() || !is_usable_price(current_price) {
            return 1;
        }
        let n = (notional / (current_price * CONTRACT_MULTIPLIER)).floor();
        if n >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            (n as u32).max(1)
        }
    }

    /// Approximate parameters from literal offsets. Not a pricing model:
    /// strikes sit at 0 / ±10 / ±15 % of spot and premiums are fixed
    /// fractions of spot per structure.
    pub fn synthesize(
        &self,
        leg_structure: LegStructure,
        current_price: f64,
        timeframe: Timeframe,
    ) -> StrategyParameters {
        let cp = current_price;
        let legs = match leg_structure {
            LegStructure::LongCall => LegParameters::LongCall {
                strike: cp,
                premium: cp * 0.04,
            },
            LegStructure::LongPut => LegParameters::LongPut {
                strike: cp,
                premium: cp * 0.04,
            },
            LegStructure::BullCallSpread => LegParameters::Vertical {
                option_type: OptionType::Call,
                long_strike: cp,
                short_strike: cp * 1.10,
                premium_paid: cp * 0.04,
                premium_received: cp * 0.02,
            },
            LegStructure::BullCallSpreadWide => LegParameters::Vertical {
                option_type: OptionType::Call,
                long_strike: cp,
                short_strike: cp * 1.15,
                premium_paid: cp * 0.04,
                premium_received: cp * 0.015,
            },
            LegStructure::BearPutSpread => LegParameters::Vertical {
                option_type: OptionType::Put,
                long_strike: cp,
                short_strike: cp * 0.90,
                premium_paid: cp * 0.04,
                premium_received: cp * 0.02,
            },
            LegStructure::CallRatioSpread => LegParameters::Ratio {
                long_strike: cp,
                short_strike: cp * 1.10,
                short_ratio: 2,
                premium_paid: cp * 0.04,
                premium_received_per_short: cp * 0.015,
            },
            LegStructure::SellCashSecuredPut => LegParameters::ShortPut {
                strike: cp * 0.90,
                premium: cp * 0.03,
            },
            LegStructure::SellDeepOtmPut => LegParameters::ShortPut {
                strike: cp * 0.85,
                premium: cp * 0.02,
            },
            LegStructure::SellCoveredCall => LegParameters::ShortCall {
                strike: cp * 1.10,
                premium: cp * 0.03,
            },
            LegStructure::IronCondor => LegParameters::Iron {
                long_put: cp * 0.85,
                short_put: cp * 0.90,
                short_call: cp * 1.10,
                long_call: cp * 1.15,
                premium_received: cp * 0.06,
                premium_paid: cp * 0.03,
            },
            LegStructure::IronButterfly => LegParameters::Iron {
                long_put: cp * 0.90,
                short_put: cp,
                short_call: cp,
                long_call: cp * 1.10,
                premium_received: cp * 0.05,
                premium_paid: cp * 0.025,
            },
            LegStructure::ShortStraddle => LegParameters::ShortStraddle {
                strike: cp,
                premium: cp * 0.08,
            },
        };

        let expiry_days = timeframe.expiry_days();
        let contracts = self.contracts_for(cp);
        StrategyParameters {
            leg_structure,
            current_price,
            legs,
            contracts,
            equivalent_shares: CONTRACT_MULTIPLIER * f64::from(contracts),
            expiry_days,
            expiry_label: format!("{}d", expiry_days),
            data_source: DataSource::Synthetic,
        }
    }

    /// Nearest-to-the-money contract of `option_type` within the bind window.
    /// `None` means no contract qualified and the caller should synthesize.
    pub fn bind(
        &self,
        ticker: &str,
        option_type: OptionType,
        current_price: f64,
        target_days: u32,
        as_of: NaiveDate,
        provider: &dyn ChainDataProvider,
    ) -> Option<BoundOptionLeg> {
        self.bind_near(
            ticker,
            option_type,
            current_price,
            current_price,
            target_days,
            as_of,
            provider,
        )
    }

    /// Same filter as [`bind`](Self::bind), ranked by distance to
    /// `target_strike` instead of spot.
    #[allow(clippy::too_many_arguments)]
    pub fn bind_near(
        &self,
        ticker: &str,
        option_type: OptionType,
        current_price: f64,
        target_strike: f64,
        target_days: u32,
        as_of: NaiveDate,
        provider: &dyn ChainDataProvider,
    ) -> Option<BoundOptionLeg> {
        if !is_usable_price(current_price) || !target_strike.is_finite() {
            return None;
        }
        let chain = match provider.option_chain(ticker) {
            Ok(c) => c,
            Err(e) => {
                warn!("option chain for {} unavailable: {:#}", ticker, e);
                return None;
            }
        };
        let target_expiry = as_of + Duration::days(i64::from(target_days));

        let mut best: Option<(f64, BoundOptionLeg)> = None;
        for q in chain {
            if q.option_type != option_type {
                continue;
            }
            if days_between(target_expiry, q.expiration_date).abs() > self.window.expiry_days {
                continue;
            }
            if (q.strike - current_price).abs() / current_price > self.window.strike_pct {
                continue;
            }
            let Some(premium) = q.premium() else {
                continue;
            };
            let distance = (q.strike - target_strike).abs() / current_price;
            if matches!(best, Some((d, _)) if d <= distance) {
                continue;
            }
            best = Some((
                distance,
                BoundOptionLeg {
                    days_to_expiry: days_between(as_of, q.expiration_date),
                    contract_id: q.contract_id,
                    option_type: q.option_type,
                    strike: q.strike,
                    expiration_date: q.expiration_date,
                    delta: q.delta,
                    gamma: q.gamma,
                    theta: q.theta,
                    vega: q.vega,
                    implied_volatility: q.implied_volatility,
                    premium_per_share: premium,
                    data_source: DataSource::Real,
                },
            ));
        }

        match best {
            Some((_, leg)) => {
                debug!(
                    "bound {} {} strike {} exp {} delta {:.4} premium {:.2}",
                    ticker,
                    leg.option_type,
                    leg.strike,
                    leg.expiration_date,
                    leg.delta,
                    leg.premium_per_share
                );
                Some(leg)
            }
            None => {
                debug!(
                    "no {} contract for {} near {:.2} within {}d of {}",
                    option_type, ticker, target_strike, self.window.expiry_days, target_expiry
                );
                None
            }
        }
    }

    /// Parameters straight from a bound contract, for structures made of that
    /// single long leg. Other structures (or a leg of the wrong type) get `None`.
    pub fn from_bound_leg(
        &self,
        leg_structure: LegStructure,
        current_price: f64,
        leg: &BoundOptionLeg,
    ) -> Option<StrategyParameters> {
        let legs = match (leg_structure, leg.option_type) {
            (LegStructure::LongCall, OptionType::Call) => LegParameters::LongCall {
                strike: leg.strike,
                premium: leg.premium_per_share,
            },
            (LegStructure::LongPut, OptionType::Put) => LegParameters::LongPut {
                strike: leg.strike,
                premium: leg.premium_per_share,
            },
            _ => return None,
        };
        let contracts = self.contracts_for(current_price);
        Some(StrategyParameters {
            leg_structure,
            current_price,
            legs,
            contracts,
            equivalent_shares: CONTRACT_MULTIPLIER * f64::from(contracts),
            expiry_days: u32::try_from(leg.days_to_expiry.max(0)).unwrap_or(u32::MAX),
            expiry_label: leg.expiration_date.to_string(),
            data_source: DataSource::Real,
        })
    }
}
