//! Delta-one stock leg sized to match an option position's delta exposure.

use tracing::warn;

use crate::types::{DegenerateInput, DeltaOneHedge, HedgeDirection, OptionType};
use crate::utils::{is_usable_price, round_to};

const MARGIN_RATE: f64 = 0.10;

#[derive(Debug, Default, Clone, Copy)]
pub struct DeltaOneHedgeGenerator;

impl DeltaOneHedgeGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Stock position worth `option_notional × |delta|`. Degenerate inputs
    /// give an all-zero hedge with the reason attached.
    pub fn hedge(
        &self,
        option_notional: f64,
        delta: f64,
        current_price: f64,
        direction: HedgeDirection,
    ) -> DeltaOneHedge {
        let degenerate = if !delta.is_finite() || delta == 0.0 {
            Some(DegenerateInput::ZeroDelta)
        } else if !is_usable_price(current_price) {
            Some(DegenerateInput::NonPositivePrice)
        } else if !option_notional.is_finite() || option_notional <= 0.0 {
            Some(DegenerateInput::NonPositiveNotional)
        } else {
            None
        };

        if let Some(reason) = degenerate {
            warn!(
                "degenerate hedge input ({:?}): notional {} delta {} price {}",
                reason, option_notional, delta, current_price
            );
            return DeltaOneHedge {
                direction,
                option_notional: if option_notional.is_finite() { option_notional } else { 0.0 },
                delta: if delta.is_finite() { delta } else { 0.0 },
                notional: 0.0,
                margin: 0.0,
                shares: 0,
                entry_price: if current_price.is_finite() { current_price } else { 0.0 },
                stop_loss: 0.0,
                take_profit: 0.0,
                degenerate: Some(reason),
            };
        }

        let notional = option_notional * delta.abs();
        let (stop, take) = match direction {
            HedgeDirection::Long => (0.90, 1.20),
            HedgeDirection::Short => (1.10, 0.80),
        };
        DeltaOneHedge {
            direction,
            option_notional,
            delta,
            notional,
            margin: notional * MARGIN_RATE,
            shares: (notional / current_price).floor() as u64,
            entry_price: current_price,
            stop_loss: current_price * stop,
            take_profit: current_price * take,
            degenerate: None,
        }
    }
}

/// Rough delta when the chain has no Greek: ±0.5 moved by moneyness (capped
/// at 0.4) and shrunk for expiries under 90 days.
pub fn proxy_delta(option_type: OptionType, strike: f64, current_price: f64, days: i64) -> f64 {
    if !is_usable_price(strike) || !is_usable_price(current_price) {
        return 0.0;
    }
    let shift = ((current_price - strike).abs() / strike * 0.5).min(0.4);
    let base = match option_type {
        OptionType::Call if current_price >= strike => 0.5 + shift,
        OptionType::Call => 0.5 - shift,
        OptionType::Put if current_price <= strike => -0.5 - shift,
        OptionType::Put => -0.5 + shift,
    };
    let time_factor = (days as f64 / 90.0).clamp(0.0, 1.0);
    round_to(base * time_factor, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_from_notional_and_delta() {
        let h = DeltaOneHedgeGenerator::new().hedge(30_000.0, 0.56, 250.0, HedgeDirection::Long);
        assert!((h.notional - 16_800.0).abs() < 1e-9);
        assert!((h.margin - 1_680.0).abs() < 1e-9);
        assert_eq!(h.shares, 67);
        assert!((h.stop_loss - 225.0).abs() < 1e-9);
        assert!((h.take_profit - 300.0).abs() < 1e-9);
        assert!(h.degenerate.is_none());
    }

    #[test]
    fn short_uses_negative_delta_magnitude() {
        let h = DeltaOneHedgeGenerator::new().hedge(10_000.0, -0.4, 100.0, HedgeDirection::Short);
        assert!((h.notional - 4_000.0).abs() < 1e-9);
        assert_eq!(h.shares, 40);
        assert!((h.stop_loss - 110.0).abs() < 1e-9);
        assert!((h.take_profit - 80.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs_are_flagged() {
        let g = DeltaOneHedgeGenerator::new();
        let h = g.hedge(30_000.0, 0.0, 100.0, HedgeDirection::Long);
        assert_eq!(h.degenerate, Some(DegenerateInput::ZeroDelta));
        assert_eq!(h.shares, 0);
        assert_eq!(h.notional, 0.0);

        let h = g.hedge(30_000.0, 0.5, 0.0, HedgeDirection::Long);
        assert_eq!(h.degenerate, Some(DegenerateInput::NonPositivePrice));
        let h = g.hedge(30_000.0, 0.5, f64::NAN, HedgeDirection::Long);
        assert_eq!(h.degenerate, Some(DegenerateInput::NonPositivePrice));
        assert_eq!(h.entry_price, 0.0);

        let h = g.hedge(-1.0, 0.5, 100.0, HedgeDirection::Short);
        assert_eq!(h.degenerate, Some(DegenerateInput::NonPositiveNotional));
    }

    #[test]
    fn proxy_delta_shapes() {
        assert_eq!(proxy_delta(OptionType::Call, 100.0, 100.0, 90), 0.5);
        assert_eq!(proxy_delta(OptionType::Put, 100.0, 100.0, 180), -0.5);
        assert_eq!(proxy_delta(OptionType::Call, 100.0, 110.0, 90), 0.55);
        assert_eq!(proxy_delta(OptionType::Call, 100.0, 90.0, 90), 0.45);
        assert_eq!(proxy_delta(OptionType::Put, 100.0, 90.0, 90), -0.55);
        assert_eq!(proxy_delta(OptionType::Call, 100.0, 100.0, 45), 0.25);
        assert_eq!(proxy_delta(OptionType::Call, 100.0, 500.0, 90), 0.9);
        assert_eq!(proxy_delta(OptionType::Call, 0.0, 100.0, 90), 0.0);
    }
}
