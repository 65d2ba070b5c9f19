//! Fixed archetype table keyed by (direction, strength, risk profile), with a
//! deterministic nearest-match fallback chain.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Direction, LegStructure, RiskLevel, RiskProfile, Strength, StrategyArchetype};

/// Which step of the lookup produced the archetype.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    Exact,
    SameDirectionAndRisk,
    SameDirection,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogMatch {
    pub archetype: StrategyArchetype,
    pub resolution: Resolution,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StrategyCatalog;

impl StrategyCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Always returns an archetype. A missing direction goes straight to the
    /// default entry.
    pub fn lookup(
        &self,
        direction: Option<Direction>,
        strength: Strength,
        risk: RiskProfile,
    ) -> CatalogMatch {
        let Some(direction) = direction else {
            debug!("catalog: no direction, using default archetype");
            return CatalogMatch {
                archetype: archetype(LegStructure::BullCallSpread),
                resolution: Resolution::Default,
            };
        };

        if let Some(ls) = table_entry(direction, strength, risk) {
            return CatalogMatch {
                archetype: archetype(ls),
                resolution: Resolution::Exact,
            };
        }

        if let Some(ls) = Strength::ALL
            .iter()
            .find_map(|s| table_entry(direction, *s, risk))
        {
            debug!(
                "catalog: no {:?}/{:?}/{:?} entry, matched direction+risk -> {}",
                direction, strength, risk, ls
            );
            return CatalogMatch {
                archetype: archetype(ls),
                resolution: Resolution::SameDirectionAndRisk,
            };
        }

        let by_direction = Strength::ALL.iter().find_map(|s| {
            RiskProfile::ALL
                .iter()
                .find_map(|r| table_entry(direction, *s, *r))
        });
        if let Some(ls) = by_direction {
            debug!("catalog: matched direction only -> {}", ls);
            return CatalogMatch {
                archetype: archetype(ls),
                resolution: Resolution::SameDirection,
            };
        }

        CatalogMatch {
            archetype: archetype(LegStructure::BullCallSpread),
            resolution: Resolution::Default,
        }
    }
}

/// The rule table. Every combination is listed so a new enum variant fails to
/// compile until it is placed.
fn table_entry(
    direction: Direction,
    strength: Strength,
    risk: RiskProfile,
) -> Option<LegStructure> {
    use Direction::*;
    use RiskProfile::*;
    use Strength::*;

    match (direction, strength, risk) {
        (Bullish, Strong, Aggressive) => Some(LegStructure::LongCall),
        (Bullish, Strong, Balanced) => Some(LegStructure::BullCallSpread),
        (Bullish, Strong, Conservative) => Some(LegStructure::SellCashSecuredPut),
        (Bullish, Moderate, Aggressive) => Some(LegStructure::CallRatioSpread),
        (Bullish, Moderate, Balanced) => Some(LegStructure::BullCallSpreadWide),
        (Bullish, Moderate, Conservative) => Some(LegStructure::SellDeepOtmPut),
        (Bullish, Slight, Aggressive | Balanced | Conservative) => None,

        (Bearish, Strong, Aggressive) => Some(LegStructure::LongPut),
        (Bearish, Strong, Balanced) => Some(LegStructure::BearPutSpread),
        (Bearish, Strong, Conservative) => Some(LegStructure::SellCoveredCall),
        (Bearish, Moderate | Slight, Aggressive | Balanced | Conservative) => None,

        (Neutral, Moderate, Aggressive) => Some(LegStructure::ShortStraddle),
        (Neutral, Moderate, Balanced) => Some(LegStructure::IronCondor),
        (Neutral, Moderate, Conservative) => Some(LegStructure::IronButterfly),
        (Neutral, Strong | Slight, Aggressive | Balanced | Conservative) => None,
    }
}

/// Static description of each leg structure.
pub fn archetype(ls: LegStructure) -> StrategyArchetype {
    let (name, narrative, risk) = match ls {
        LegStructure::LongCall => (
            "Long ATM Call",
            "Buy an at-the-money call on {ticker}. Suits a strong bullish view with appetite for risk: upside is open-ended and the most you can lose is the premium.",
            RiskLevel::High,
        ),
        LegStructure::LongPut => (
            "Long ATM Put",
            "Buy an at-the-money put on {ticker}. Suits a strong bearish view: gains grow as the price falls and the most you can lose is the premium.",
            RiskLevel::High,
        ),
        LegStructure::BullCallSpread => (
            "Bull Call Spread",
            "Buy a lower-strike call on {ticker} and sell a higher-strike call against it. Both risk and reward are capped.",
            RiskLevel::Medium,
        ),
        LegStructure::BullCallSpreadWide => (
            "Bull Call Spread (wide)",
            "A bull call spread on {ticker} with a wider gap between strikes, leaving more room for the rally.",
            RiskLevel::Medium,
        ),
        LegStructure::BearPutSpread => (
            "Bear Put Spread",
            "Buy a higher-strike put on {ticker} and sell a lower-strike put. Risk and reward are both capped.",
            RiskLevel::Medium,
        ),
        LegStructure::CallRatioSpread => (
            "Call Ratio Spread",
            "Buy one at-the-money call on {ticker} and sell two out-of-the-money calls. Pays best on a measured rise; a runaway rally loses money.",
            RiskLevel::High,
        ),
        LegStructure::SellCashSecuredPut => (
            "Sell OTM Put",
            "Sell a put below the current price of {ticker} and collect the premium, for investors happy to buy the stock lower.",
            RiskLevel::MediumLow,
        ),
        LegStructure::SellDeepOtmPut => (
            "Sell Deep OTM Put",
            "Sell a put well below the current price of {ticker}. Lower risk, smaller income.",
            RiskLevel::Low,
        ),
        LegStructure::SellCoveredCall => (
            "Sell OTM Call",
            "Sell a call above the current price of {ticker} and keep the premium if it stays below the strike. Losses grow without limit on a rally.",
            RiskLevel::High,
        ),
        LegStructure::IronCondor => (
            "Iron Condor",
            "Sell an out-of-the-money put and call on {ticker} and buy further wings. Collects premium while the price stays in the range.",
            RiskLevel::Medium,
        ),
        LegStructure::IronButterfly => (
            "Iron Butterfly",
            "Sell the at-the-money straddle on {ticker} and buy wings on both sides. Like a condor with a narrower profit zone.",
            RiskLevel::MediumLow,
        ),
        LegStructure::ShortStraddle => (
            "Short Straddle",
            "Sell a call and a put at the same strike on {ticker}. Profits if the price stays put and volatility falls; losses are open-ended.",
            RiskLevel::VeryHigh,
        ),
    };
    StrategyArchetype {
        name: Cow::Borrowed(name),
        leg_structure: ls,
        narrative_template: Cow::Borrowed(narrative),
        qualitative_risk: risk,
    }
}
