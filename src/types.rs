//! Core domain types: market views, leg structures, parameters, metrics,
//! bound option legs and hedges.

use std::borrow::Cow;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Shares controlled by one listed equity option contract.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Strong,
    Moderate,
    #[serde(alias = "weak")]
    Slight,
}

impl Strength {
    pub const ALL: [Strength; 3] = [Strength::Strong, Strength::Moderate, Strength::Slight];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Short,
    Medium,
    Long,
}

impl Timeframe {
    /// Target days to expiry for the bucket.
    pub fn expiry_days(self) -> u32 {
        match self {
            Timeframe::Short => 30,
            Timeframe::Medium => 90,
            Timeframe::Long => 180,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Aggressive,
    Balanced,
    Conservative,
}

impl RiskProfile {
    pub const ALL: [RiskProfile; 3] = [
        RiskProfile::Aggressive,
        RiskProfile::Balanced,
        RiskProfile::Conservative,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    #[serde(alias = "CALL", alias = "Call", alias = "C")]
    Call,
    #[serde(alias = "PUT", alias = "Put", alias = "P")]
    Put,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bullish => write!(f, "bullish"),
            Direction::Bearish => write!(f, "bearish"),
            Direction::Neutral => write!(f, "neutral"),
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskProfile::Aggressive => write!(f, "aggressive"),
            RiskProfile::Balanced => write!(f, "balanced"),
            RiskProfile::Conservative => write!(f, "conservative"),
        }
    }
}

/// Which intent fields were matched by keywords instead of defaulted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExplicitFields {
    pub strength: bool,
    pub timeframe: bool,
    pub risk_profile: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedIntent {
    pub ticker: Option<String>,
    pub direction: Option<Direction>,
    pub strength: Strength,
    pub timeframe: Timeframe,
    pub risk_profile: RiskProfile,
    pub confidence: f64,
    pub raw_text: String,
    pub explicit: ExplicitFields,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum LegStructure {
    LongCall,
    LongPut,
    BullCallSpread,
    BullCallSpreadWide,
    BearPutSpread,
    CallRatioSpread,
    SellCashSecuredPut,
    SellDeepOtmPut,
    /// Traded without the stock: a lone short call 10% out of the money.
    SellCoveredCall,
    IronCondor,
    IronButterfly,
    ShortStraddle,
}

impl LegStructure {
    pub const ALL: [LegStructure; 12] = [
        LegStructure::LongCall,
        LegStructure::LongPut,
        LegStructure::BullCallSpread,
        LegStructure::BullCallSpreadWide,
        LegStructure::BearPutSpread,
        LegStructure::CallRatioSpread,
        LegStructure::SellCashSecuredPut,
        LegStructure::SellDeepOtmPut,
        LegStructure::SellCoveredCall,
        LegStructure::IronCondor,
        LegStructure::IronButterfly,
        LegStructure::ShortStraddle,
    ];

    /// Net market exposure of the position.
    pub fn bias(self) -> Direction {
        match self {
            LegStructure::LongCall
            | LegStructure::BullCallSpread
            | LegStructure::BullCallSpreadWide
            | LegStructure::CallRatioSpread
            | LegStructure::SellCashSecuredPut
            | LegStructure::SellDeepOtmPut => Direction::Bullish,
            LegStructure::LongPut
            | LegStructure::BearPutSpread
            | LegStructure::SellCoveredCall => Direction::Bearish,
            LegStructure::IronCondor
            | LegStructure::IronButterfly
            | LegStructure::ShortStraddle => Direction::Neutral,
        }
    }

    /// Option type of the leg that carries the directional exposure, if any.
    pub fn primary_option_type(self) -> Option<OptionType> {
        match self {
            LegStructure::LongCall
            | LegStructure::BullCallSpread
            | LegStructure::BullCallSpreadWide
            | LegStructure::CallRatioSpread
            | LegStructure::SellCoveredCall => Some(OptionType::Call),
            LegStructure::LongPut
            | LegStructure::BearPutSpread
            | LegStructure::SellCashSecuredPut
            | LegStructure::SellDeepOtmPut => Some(OptionType::Put),
            LegStructure::IronCondor
            | LegStructure::IronButterfly
            | LegStructure::ShortStraddle => None,
        }
    }

    /// Option types of every leg the structure trades.
    pub fn option_types(self) -> &'static [OptionType] {
        match self.primary_option_type() {
            Some(OptionType::Call) => &[OptionType::Call],
            Some(OptionType::Put) => &[OptionType::Put],
            None => &[OptionType::Put, OptionType::Call],
        }
    }

    /// Single long at-the-money leg: a bound chain contract can stand in for
    /// the whole strategy.
    pub fn accepts_bound_leg(self) -> bool {
        matches!(self, LegStructure::LongCall | LegStructure::LongPut)
    }

    pub fn is_spread(self) -> bool {
        matches!(
            self,
            LegStructure::BullCallSpread
                | LegStructure::BullCallSpreadWide
                | LegStructure::BearPutSpread
                | LegStructure::IronCondor
                | LegStructure::IronButterfly
        )
    }
}

impl fmt::Display for LegStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LegStructure::LongCall => "long-call",
            LegStructure::LongPut => "long-put",
            LegStructure::BullCallSpread => "bull-call-spread",
            LegStructure::BullCallSpreadWide => "bull-call-spread-wide",
            LegStructure::BearPutSpread => "bear-put-spread",
            LegStructure::CallRatioSpread => "call-ratio-spread",
            LegStructure::SellCashSecuredPut => "sell-cash-secured-put",
            LegStructure::SellDeepOtmPut => "sell-deep-otm-put",
            LegStructure::SellCoveredCall => "sell-covered-call",
            LegStructure::IronCondor => "iron-condor",
            LegStructure::IronButterfly => "iron-butterfly",
            LegStructure::ShortStraddle => "short-straddle",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    Low,
    MediumLow,
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrategyArchetype {
    pub name: Cow<'static, str>,
    pub leg_structure: LegStructure,
    pub narrative_template: Cow<'static, str>,
    pub qualitative_risk: RiskLevel,
}

impl StrategyArchetype {
    pub fn render_narrative(&self, ticker: Option<&str>) -> String {
        self.narrative_template
            .replace("{ticker}", ticker.unwrap_or("the underlying"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Real,
    Synthetic,
}

/// Strikes and per-share premiums, keyed by the shape of the position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "shape", rename_all = "kebab-case")]
pub enum LegParameters {
    #[serde(rename_all = "camelCase")]
    LongCall { strike: f64, premium: f64 },
    #[serde(rename_all = "camelCase")]
    LongPut { strike: f64, premium: f64 },
    /// Debit vertical: long `long_strike`, short `short_strike`, same type.
    #[serde(rename_all = "camelCase")]
    Vertical {
        option_type: OptionType,
        long_strike: f64,
        short_strike: f64,
        premium_paid: f64,
        premium_received: f64,
    },
    /// One long call against `short_ratio` short calls further out.
    #[serde(rename_all = "camelCase")]
    Ratio {
        long_strike: f64,
        short_strike: f64,
        short_ratio: u32,
        premium_paid: f64,
        premium_received_per_short: f64,
    },
    #[serde(rename_all = "camelCase")]
    ShortPut { strike: f64, premium: f64 },
    /// One naked out-of-the-money call sold per contract.
    #[serde(rename_all = "camelCase")]
    ShortCall { strike: f64, premium: f64 },
    /// Short put/call body with long wings. A butterfly has
    /// `short_put == short_call`.
    #[serde(rename_all = "camelCase")]
    Iron {
        long_put: f64,
        short_put: f64,
        short_call: f64,
        long_call: f64,
        premium_received: f64,
        premium_paid: f64,
    },
    #[serde(rename_all = "camelCase")]
    ShortStraddle { strike: f64, premium: f64 },
}

impl LegParameters {
    /// Premium paid minus premium received, per share. Negative for credits.
    pub fn net_debit(&self) -> f64 {
        match *self {
            LegParameters::LongCall { premium, .. } | LegParameters::LongPut { premium, .. } => {
                premium
            }
            LegParameters::Vertical {
                premium_paid,
                premium_received,
                ..
            } => premium_paid - premium_received,
            LegParameters::Ratio {
                short_ratio,
                premium_paid,
                premium_received_per_short,
                ..
            } => premium_paid - premium_received_per_short * short_ratio as f64,
            LegParameters::ShortPut { premium, .. }
            | LegParameters::ShortCall { premium, .. }
            | LegParameters::ShortStraddle { premium, .. } => -premium,
            LegParameters::Iron {
                premium_received,
                premium_paid,
                ..
            } => premium_paid - premium_received,
        }
    }

    /// Distance between the strikes that cap the position, if it has one.
    pub fn strike_width(&self) -> Option<f64> {
        match *self {
            LegParameters::Vertical {
                long_strike,
                short_strike,
                ..
            }
            | LegParameters::Ratio {
                long_strike,
                short_strike,
                ..
            } => Some((short_strike - long_strike).abs()),
            LegParameters::Iron {
                long_put,
                short_put,
                short_call,
                long_call,
                ..
            } => Some((short_put - long_put).max(long_call - short_call)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrategyParameters {
    pub leg_structure: LegStructure,
    pub current_price: f64,
    pub legs: LegParameters,
    pub contracts: u32,
    pub equivalent_shares: f64,
    pub expiry_days: u32,
    pub expiry_label: String,
    pub data_source: DataSource,
}

impl StrategyParameters {
    /// Dollar multiplier applied to per-share values.
    pub fn multiplier(&self) -> f64 {
        CONTRACT_MULTIPLIER * self.contracts as f64
    }

    /// Strike of the leg bought, in the flat buy/sell view.
    pub fn buy_strike(&self) -> Option<f64> {
        match self.legs {
            LegParameters::LongCall { strike, .. } | LegParameters::LongPut { strike, .. } => {
                Some(strike)
            }
            LegParameters::Vertical { long_strike, .. }
            | LegParameters::Ratio { long_strike, .. } => Some(long_strike),
            LegParameters::Iron { long_put, .. } => Some(long_put),
            LegParameters::ShortPut { .. }
            | LegParameters::ShortCall { .. }
            | LegParameters::ShortStraddle { .. } => None,
        }
    }

    /// Strike of the leg sold, in the flat buy/sell view.
    pub fn sell_strike(&self) -> Option<f64> {
        match self.legs {
            LegParameters::LongCall { .. } | LegParameters::LongPut { .. } => None,
            LegParameters::Vertical { short_strike, .. }
            | LegParameters::Ratio { short_strike, .. } => Some(short_strike),
            LegParameters::Iron { short_call, .. } => Some(short_call),
            LegParameters::ShortPut { strike, .. }
            | LegParameters::ShortCall { strike, .. }
            | LegParameters::ShortStraddle { strike, .. } => Some(strike),
        }
    }

    pub fn premium_paid(&self) -> Option<f64> {
        match self.legs {
            LegParameters::LongCall { premium, .. } | LegParameters::LongPut { premium, .. } => {
                Some(premium)
            }
            LegParameters::Vertical { premium_paid, .. }
            | LegParameters::Ratio { premium_paid, .. }
            | LegParameters::Iron { premium_paid, .. } => Some(premium_paid),
            LegParameters::ShortPut { .. }
            | LegParameters::ShortCall { .. }
            | LegParameters::ShortStraddle { .. } => None,
        }
    }

    pub fn premium_received(&self) -> Option<f64> {
        match self.legs {
            LegParameters::LongCall { .. } | LegParameters::LongPut { .. } => None,
            LegParameters::Vertical {
                premium_received, ..
            }
            | LegParameters::Iron {
                premium_received, ..
            } => Some(premium_received),
            LegParameters::Ratio {
                short_ratio,
                premium_received_per_short,
                ..
            } => Some(premium_received_per_short * short_ratio as f64),
            LegParameters::ShortPut { premium, .. }
            | LegParameters::ShortCall { premium, .. }
            | LegParameters::ShortStraddle { premium, .. } => Some(premium),
        }
    }
}

/// A profit or loss extreme; `Unbounded` serializes as the string "unbounded".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfitBound {
    Finite(f64),
    Unbounded,
}

impl ProfitBound {
    pub fn finite(self) -> Option<f64> {
        match self {
            ProfitBound::Finite(v) => Some(v),
            ProfitBound::Unbounded => None,
        }
    }

    pub fn is_unbounded(self) -> bool {
        matches!(self, ProfitBound::Unbounded)
    }
}

impl Serialize for ProfitBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProfitBound::Finite(v) => serializer.serialize_f64(*v),
            ProfitBound::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

impl<'de> Deserialize<'de> for ProfitBound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Text(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Num(v) => Ok(ProfitBound::Finite(v)),
            Repr::Text(s) if s.eq_ignore_ascii_case("unbounded") => Ok(ProfitBound::Unbounded),
            Repr::Text(s) => Err(serde::de::Error::custom(format!(
                "expected a number or \"unbounded\", got {:?}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrategyMetrics {
    pub max_loss: ProfitBound,
    pub max_gain: ProfitBound,
    pub breakeven: f64,
    pub upper_breakeven: Option<f64>,
    pub probability_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoundOptionLeg {
    pub contract_id: String,
    pub option_type: OptionType,
    pub strike: f64,
    pub expiration_date: NaiveDate,
    pub days_to_expiry: i64,
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub implied_volatility: f64,
    pub premium_per_share: f64,
    pub data_source: DataSource,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HedgeDirection {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DegenerateInput {
    ZeroDelta,
    NonPositivePrice,
    NonPositiveNotional,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeltaOneHedge {
    pub direction: HedgeDirection,
    pub option_notional: f64,
    pub delta: f64,
    pub notional: f64,
    pub margin: f64,
    pub shares: u64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub degenerate: Option<DegenerateInput>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PayoffPoint {
    pub price: f64,
    pub payoff: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profit_bound_serializes_sentinel() {
        let v = serde_json::to_string(&ProfitBound::Unbounded).unwrap();
        assert_eq!(v, "\"unbounded\"");
        let back: ProfitBound = serde_json::from_str(&v).unwrap();
        assert!(back.is_unbounded());

        let f: ProfitBound = serde_json::from_str("-400.0").unwrap();
        assert_eq!(f, ProfitBound::Finite(-400.0));
        assert!(serde_json::from_str::<ProfitBound>("\"lots\"").is_err());
    }

    #[test]
    fn strength_accepts_weak_alias() {
        let s: Strength = serde_json::from_str("\"weak\"").unwrap();
        assert_eq!(s, Strength::Slight);
    }

    #[test]
    fn leg_structure_wire_names_match_display() {
        for ls in LegStructure::ALL {
            let json = serde_json::to_string(&ls).unwrap();
            assert_eq!(json, format!("\"{}\"", ls));
        }
    }

    #[test]
    fn flat_view_of_vertical() {
        let p = StrategyParameters {
            leg_structure: LegStructure::BearPutSpread,
            current_price: 100.0,
            legs: LegParameters::Vertical {
                option_type: OptionType::Put,
                long_strike: 100.0,
                short_strike: 90.0,
                premium_paid: 4.0,
                premium_received: 2.0,
            },
            contracts: 1,
            equivalent_shares: 100.0,
            expiry_days: 30,
            expiry_label: "30d".into(),
            data_source: DataSource::Synthetic,
        };
        assert_eq!(p.buy_strike(), Some(100.0));
        assert_eq!(p.sell_strike(), Some(90.0));
        assert_eq!(p.premium_paid(), Some(4.0));
        assert_eq!(p.premium_received(), Some(2.0));
        assert_eq!(p.legs.strike_width(), Some(10.0));
        assert!((p.legs.net_debit() - 2.0).abs() < 1e-12);
    }
}
