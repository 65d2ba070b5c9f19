//! Maps a numeric analysis signal and an investor style onto an option
//! type, a strike offset and catalog inputs.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Direction, OptionType, RiskProfile, Strength};

/// Hits that signal hesitation in the free-text rationale.
const CAUTION_KEYWORDS: &[&str] = &[
    "不是",
    "观望",
    "谨慎",
    "小仓位",
    "等待",
    "不建议",
    "避免",
    "wait",
    "cautious",
    "caution",
    "avoid",
    "small position",
    "hold off",
];

/// Any one of these is enough on its own.
const NEGATION_PHRASES: &[&str] = &[
    "不是大举买入",
    "不建议买入",
    "not the time",
    "don't buy",
    "do not buy",
];

const CAUTION_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSignal {
    pub score: f64,
    pub direction: Direction,
    pub strength: Strength,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// A named investing style reduced to a risk profile. Unknown names keep
/// their spelling but trade as balanced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvestorStyle {
    pub name: String,
    pub profile: RiskProfile,
}

impl InvestorStyle {
    pub fn parse(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        let profile = match name.as_str() {
            "aggressive" | "soros" | "momentum" => RiskProfile::Aggressive,
            "conservative" | "buffett" | "value" => RiskProfile::Conservative,
            "balanced" | "lynch" | "growth" => RiskProfile::Balanced,
            other => {
                debug!("unknown investor style {:?}, trading as balanced", other);
                RiskProfile::Balanced
            }
        };
        Self { name, profile }
    }
}

impl Default for InvestorStyle {
    fn default() -> Self {
        Self::parse("balanced")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreBand {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl ScoreBand {
    /// `score` must already be clamped to 0..=100.
    pub fn from_score(score: f64) -> Self {
        if score > 80.0 {
            ScoreBand::StrongBullish
        } else if score >= 60.0 {
            ScoreBand::Bullish
        } else if score >= 40.0 {
            ScoreBand::Neutral
        } else if score >= 20.0 {
            ScoreBand::Bearish
        } else {
            ScoreBand::StrongBearish
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            ScoreBand::StrongBullish | ScoreBand::Bullish => Direction::Bullish,
            ScoreBand::Neutral => Direction::Neutral,
            ScoreBand::Bearish | ScoreBand::StrongBearish => Direction::Bearish,
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScoreBand::StrongBullish => "strong bullish",
            ScoreBand::Bullish => "bullish",
            ScoreBand::Neutral => "neutral",
            ScoreBand::Bearish => "bearish",
            ScoreBand::StrongBearish => "strong bearish",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchDecision {
    pub score: f64,
    pub band: ScoreBand,
    pub style: String,
    pub direction: Direction,
    pub strength: Strength,
    pub risk_profile: RiskProfile,
    pub option_type: OptionType,
    pub strike_offset_pct: f64,
    pub target_strike: f64,
    pub archetype_label: String,
    pub rationale: String,
    pub caution_override: bool,
    /// The signal's stated direction points the other way from its score.
    #[serde(default)]
    pub direction_conflict: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StrategyMatcher;

impl StrategyMatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn match_signal(
        &self,
        signal: &AnalysisSignal,
        style: &InvestorStyle,
        current_price: f64,
    ) -> MatchDecision {
        let score = if signal.score.is_nan() {
            50.0
        } else {
            signal.score.clamp(0.0, 100.0)
        };
        let caution_override = signal.rationale.as_deref().is_some_and(is_cautious);
        let scored = ScoreBand::from_score(score);
        let direction_conflict = matches!(
            (signal.direction, scored.direction()),
            (Direction::Bullish, Direction::Bearish) | (Direction::Bearish, Direction::Bullish)
        );
        if direction_conflict {
            debug!(
                "signal direction {} contradicts score {:.0} ({}), reading neutral",
                signal.direction, score, scored
            );
        }
        let band = if caution_override || direction_conflict {
            ScoreBand::Neutral
        } else {
            scored
        };

        let (option_type, offset, moneyness, why) = choose_leg(band, style.profile);
        let strength = match band {
            ScoreBand::StrongBullish | ScoreBand::StrongBearish => Strength::Strong,
            ScoreBand::Neutral => Strength::Moderate,
            ScoreBand::Bullish | ScoreBand::Bearish => match signal.strength {
                Strength::Strong => Strength::Moderate,
                s => s,
            },
        };

        let leg_name = match option_type {
            OptionType::Call => "Long Call",
            OptionType::Put => "Long Put",
        };
        let archetype_label = format!("{} ({})", leg_name, moneyness);
        let mut rationale = format!(
            "Score {:.0} reads {}; {} style ({}) points to {}: {}.",
            score, band, style.name, style.profile, archetype_label, why
        );
        if caution_override {
            rationale
                .push_str(" The analysis text urges caution, so the numeric view was set aside.");
        }
        if direction_conflict {
            rationale.push_str(&format!(
                " The stated {} direction disagrees with the score, so no side is taken.",
                signal.direction
            ));
        }

        MatchDecision {
            score,
            band,
            style: style.name.clone(),
            direction: band.direction(),
            strength,
            risk_profile: style.profile,
            option_type,
            strike_offset_pct: offset,
            target_strike: current_price * (1.0 + offset),
            archetype_label,
            rationale,
            caution_override,
            direction_conflict,
        }
    }
}

fn is_cautious(text: &str) -> bool {
    let lower = text.to_lowercase();
    if NEGATION_PHRASES.iter().any(|p| lower.contains(p)) {
        return true;
    }
    let hits = CAUTION_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .count();
    hits >= CAUTION_THRESHOLD
}

/// Option type, strike offset from spot, moneyness label and reason.
fn choose_leg(
    band: ScoreBand,
    profile: RiskProfile,
) -> (OptionType, f64, &'static str, &'static str) {
    use OptionType::*;
    use RiskProfile::*;
    use ScoreBand::*;

    match (band, profile) {
        (StrongBullish, Aggressive) => (
            Call,
            0.03,
            "slightly OTM",
            "maximum leverage on a strong rally",
        ),
        (StrongBullish, Balanced) => (Call, 0.0, "ATM", "balanced leverage and cost"),
        (StrongBullish, Conservative) => (
            Call,
            0.0,
            "ATM",
            "participates without paying for distant strikes",
        ),
        (Bullish, Aggressive) => (Call, 0.03, "slightly OTM", "cheap upside exposure"),
        (Bullish, Balanced) => (Call, 0.0, "ATM", "follows the trend at moderate cost"),
        (Bullish, Conservative) => (Call, -0.025, "slightly ITM", "higher delta, less time decay"),
        (Neutral, _) => (
            Call,
            0.0,
            "watch only",
            "no clear direction, keep size small",
        ),
        (Bearish, Aggressive) => (Put, 0.0, "ATM", "direct downside exposure"),
        (Bearish, Balanced) => (Put, 0.0, "ATM", "protects against further declines"),
        (Bearish, Conservative) => (Put, 0.025, "slightly ITM", "higher delta hedge"),
        (StrongBearish, Aggressive) => (
            Put,
            -0.03,
            "slightly OTM",
            "maximum leverage on a sharp decline",
        ),
        (StrongBearish, Balanced) => (Put, 0.0, "ATM", "solid downside protection"),
        (StrongBearish, Conservative) => (Put, 0.0, "ATM", "hedges an existing position"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(
        score: f64,
        direction: Direction,
        strength: Strength,
        rationale: Option<&str>,
    ) -> AnalysisSignal {
        AnalysisSignal {
            score,
            direction,
            strength,
            rationale: rationale.map(str::to_string),
        }
    }

    fn run(sig: &AnalysisSignal, style: &str) -> MatchDecision {
        StrategyMatcher::new().match_signal(sig, &InvestorStyle::parse(style), 100.0)
    }

    #[test]
    fn strong_bullish_aggressive_buys_slightly_otm_call() {
        let d = run(&signal(85.0, Direction::Bullish, Strength::Strong, None), "aggressive");
        assert_eq!(d.band, ScoreBand::StrongBullish);
        assert_eq!(d.option_type, OptionType::Call);
        assert!((d.strike_offset_pct - 0.03).abs() < 1e-12);
        assert!((d.target_strike - 103.0).abs() < 1e-9);
        assert!(d.rationale.contains("85"));
        assert!(d.rationale.contains("aggressive"));
    }

    #[test]
    fn style_aliases() {
        let d = run(&signal(85.0, Direction::Bullish, Strength::Strong, None), "buffett");
        assert_eq!(d.risk_profile, RiskProfile::Conservative);
        assert_eq!(d.strike_offset_pct, 0.0);
        assert!(d.rationale.contains("buffett"));

        let d = run(&signal(30.0, Direction::Bearish, Strength::Moderate, None), "soros");
        assert_eq!(d.option_type, OptionType::Put);
        assert_eq!(d.archetype_label, "Long Put (ATM)");

        let s = InvestorStyle::parse("Dalio");
        assert_eq!(s.name, "dalio");
        assert_eq!(s.profile, RiskProfile::Balanced);
    }

    #[test]
    fn strong_bearish_aggressive_goes_otm_put() {
        let d = run(&signal(15.0, Direction::Bearish, Strength::Strong, None), "aggressive");
        assert_eq!(d.option_type, OptionType::Put);
        assert!((d.target_strike - 97.0).abs() < 1e-9);
        assert_eq!(d.strength, Strength::Strong);
    }

    #[test]
    fn band_edges() {
        assert_eq!(ScoreBand::from_score(80.0), ScoreBand::Bullish);
        assert_eq!(ScoreBand::from_score(80.5), ScoreBand::StrongBullish);
        assert_eq!(ScoreBand::from_score(60.0), ScoreBand::Bullish);
        assert_eq!(ScoreBand::from_score(59.9), ScoreBand::Neutral);
        assert_eq!(ScoreBand::from_score(40.0), ScoreBand::Neutral);
        assert_eq!(ScoreBand::from_score(20.0), ScoreBand::Bearish);
        assert_eq!(ScoreBand::from_score(19.9), ScoreBand::StrongBearish);
    }

    #[test]
    fn scores_are_clamped() {
        let d = run(&signal(140.0, Direction::Bullish, Strength::Strong, None), "balanced");
        assert_eq!(d.score, 100.0);
        assert_eq!(d.band, ScoreBand::StrongBullish);
        let d = run(&signal(-5.0, Direction::Bearish, Strength::Strong, None), "balanced");
        assert_eq!(d.score, 0.0);
        assert_eq!(d.band, ScoreBand::StrongBearish);
    }

    #[test]
    fn cautious_rationale_forces_neutral() {
        let d = run(
            &signal(
                78.0,
                Direction::Bullish,
                Strength::Moderate,
                Some("基本面不错，但建议观望，谨慎对待"),
            ),
            "aggressive",
        );
        assert!(d.caution_override);
        assert_eq!(d.band, ScoreBand::Neutral);
        assert_eq!(d.direction, Direction::Neutral);
        assert_eq!(d.archetype_label, "Long Call (watch only)");
    }

    #[test]
    fn one_keyword_is_not_enough_but_a_negation_is() {
        let d = run(
            &signal(70.0, Direction::Bullish, Strength::Moderate, Some("Worth the wait.")),
            "balanced",
        );
        assert!(!d.caution_override);
        assert_eq!(d.band, ScoreBand::Bullish);

        let d = run(
            &signal(70.0, Direction::Bullish, Strength::Moderate, Some("Now is not the time.")),
            "balanced",
        );
        assert!(d.caution_override);
    }

    #[test]
    fn stated_direction_against_the_score_reads_neutral() {
        let d = run(&signal(85.0, Direction::Bearish, Strength::Strong, None), "aggressive");
        assert!(d.direction_conflict);
        assert!(!d.caution_override);
        assert_eq!(d.band, ScoreBand::Neutral);
        assert_eq!(d.direction, Direction::Neutral);
        assert_eq!(d.strength, Strength::Moderate);
        assert!(d.rationale.contains("bearish direction disagrees"));

        let d = run(&signal(15.0, Direction::Bullish, Strength::Strong, None), "balanced");
        assert!(d.direction_conflict);
        assert_eq!(d.band, ScoreBand::Neutral);

        // A neutral label never conflicts with a directional score.
        let d = run(&signal(85.0, Direction::Neutral, Strength::Strong, None), "aggressive");
        assert!(!d.direction_conflict);
        assert_eq!(d.band, ScoreBand::StrongBullish);
    }

    #[test]
    fn non_strong_bands_cap_strength() {
        let d = run(&signal(70.0, Direction::Bullish, Strength::Strong, None), "lynch");
        assert_eq!(d.strength, Strength::Moderate);
        let d = run(&signal(30.0, Direction::Bearish, Strength::Slight, None), "lynch");
        assert_eq!(d.strength, Strength::Slight);
    }
}
