//! Request orchestration: text or signal in, a complete strategy out.
//!
//! The engine owns the pure components and borrows market data through the
//! provider traits. It performs no I/O of its own, so identical inputs and
//! `as_of` dates give identical outcomes.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{Resolution, StrategyCatalog};
use crate::chain::{ChainDataProvider, QuoteProvider};
use crate::hedge::{proxy_delta, DeltaOneHedgeGenerator};
use crate::intent::IntentExtractor;
use crate::matcher::{AnalysisSignal, InvestorStyle, MatchDecision, StrategyMatcher};
use crate::payoff::PayoffEngine;
use crate::risk::RiskMetricsCalculator;
use crate::synth::{BindWindow, ParameterSynthesizer};
use crate::types::{
    BoundOptionLeg, DeltaOneHedge, Direction, HedgeDirection, OptionType, ParsedIntent,
    PayoffPoint, RiskProfile, Strength, StrategyArchetype, StrategyMetrics, StrategyParameters,
    Timeframe,
};
use crate::utils::{is_usable_price, sanitize_symbol};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Capital per strategy. Sets the contract count, which in turn sizes
    /// the delta-one hedge.
    pub notional: f64,
    /// Used when no usable quote exists for the ticker.
    pub fallback_price: f64,
    pub min_confidence: f64,
    pub payoff: PayoffEngine,
    pub bind_window: BindWindow,
    pub default_style: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            notional: 30_000.0,
            fallback_price: 300.0,
            min_confidence: 0.3,
            payoff: PayoffEngine::default(),
            bind_window: BindWindow::default(),
            default_style: "balanced".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PriceSource {
    Quote,
    Fallback,
}

/// What the strategy was derived from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RequestSource {
    Intent {
        intent: ParsedIntent,
    },
    Signal {
        signal: AnalysisSignal,
        decision: MatchDecision,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResult {
    pub ticker: Option<String>,
    pub source: RequestSource,
    pub archetype: StrategyArchetype,
    pub narrative: String,
    pub catalog_resolution: Resolution,
    pub current_price: f64,
    pub price_source: PriceSource,
    pub parameters: StrategyParameters,
    pub metrics: StrategyMetrics,
    pub payoff: Vec<PayoffPoint>,
    pub bound_leg: Option<BoundOptionLeg>,
    pub hedge: Option<DeltaOneHedge>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum StrategyOutcome {
    Strategy(Box<StrategyResult>),
    NeedMoreInformation {
        intent: ParsedIntent,
        missing: Vec<String>,
    },
}

/// One host request: free text, or a numeric signal for a ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StrategyRequest {
    Text {
        text: String,
    },
    Signal {
        ticker: String,
        signal: AnalysisSignal,
        style: Option<String>,
    },
}

#[derive(Deserialize)]
struct SignalLine {
    ticker: String,
    score: f64,
    direction: Direction,
    strength: Strength,
    #[serde(default)]
    rationale: Option<String>,
    #[serde(default)]
    style: Option<String>,
}

impl StrategyRequest {
    /// A JSON object with ticker, score, direction and strength is a signal;
    /// anything else is free text.
    pub fn from_line(line: &str) -> Self {
        let line = line.trim();
        if line.starts_with('{') {
            if let Ok(s) = serde_json::from_str::<SignalLine>(line) {
                return StrategyRequest::Signal {
                    ticker: s.ticker,
                    signal: AnalysisSignal {
                        score: s.score,
                        direction: s.direction,
                        strength: s.strength,
                        rationale: s.rationale,
                    },
                    style: s.style,
                };
            }
        }
        StrategyRequest::Text {
            text: line.to_string(),
        }
    }
}

/// Inputs to the shared build step once the request form is resolved.
struct View<'a> {
    ticker: Option<&'a str>,
    direction: Option<Direction>,
    strength: Strength,
    risk_profile: RiskProfile,
    timeframe: Timeframe,
    /// Preferred option type and strike for the chain lookup. Ignored when
    /// the structure trades no leg of that type.
    leg_target: Option<(OptionType, f64)>,
}

pub struct StrategyEngine {
    settings: EngineSettings,
    extractor: IntentExtractor,
    catalog: StrategyCatalog,
    synth: ParameterSynthesizer,
    risk: RiskMetricsCalculator,
    matcher: StrategyMatcher,
    hedger: DeltaOneHedgeGenerator,
    chain: Arc<dyn ChainDataProvider>,
    quotes: Arc<dyn QuoteProvider>,
}

impl StrategyEngine {
    pub fn new(
        settings: EngineSettings,
        extractor: IntentExtractor,
        chain: Arc<dyn ChainDataProvider>,
        quotes: Arc<dyn QuoteProvider>,
    ) -> Self {
        let synth =
            ParameterSynthesizer::new(settings.bind_window).with_notional(settings.notional);
        Self {
            settings,
            extractor,
            catalog: StrategyCatalog::new(),
            synth,
            risk: RiskMetricsCalculator::new(),
            matcher: StrategyMatcher::new(),
            hedger: DeltaOneHedgeGenerator::new(),
            chain,
            quotes,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn from_text(&self, text: &str, as_of: NaiveDate) -> StrategyOutcome {
        let intent = self.extractor.parse(text);
        if intent.confidence < self.settings.min_confidence {
            let missing = missing_fields(&intent);
            info!(
                "Need more information (confidence {:.2}, missing {:?})",
                intent.confidence, missing
            );
            return StrategyOutcome::NeedMoreInformation { intent, missing };
        }

        let ticker = intent.ticker.clone();
        let (current_price, price_source) = self.resolve_price(ticker.as_deref());
        let view = View {
            ticker: ticker.as_deref(),
            direction: intent.direction,
            strength: intent.strength,
            risk_profile: intent.risk_profile,
            timeframe: intent.timeframe,
            leg_target: None,
        };
        let result = self.build(
            view,
            current_price,
            price_source,
            as_of,
            RequestSource::Intent { intent },
        );
        StrategyOutcome::Strategy(Box::new(result))
    }

    /// `style` falls back to the configured default when absent.
    pub fn from_signal(
        &self,
        ticker: &str,
        signal: &AnalysisSignal,
        style: Option<&str>,
        as_of: NaiveDate,
    ) -> StrategyOutcome {
        let ticker = sanitize_symbol(ticker);
        let style = InvestorStyle::parse(style.unwrap_or(&self.settings.default_style));
        let (current_price, price_source) = self.resolve_price(Some(ticker.as_str()));
        let decision = self.matcher.match_signal(signal, &style, current_price);

        let view = View {
            ticker: Some(ticker.as_str()),
            direction: Some(decision.direction),
            strength: decision.strength,
            risk_profile: decision.risk_profile,
            timeframe: Timeframe::Medium,
            leg_target: Some((decision.option_type, decision.target_strike)),
        };
        let source = RequestSource::Signal {
            signal: signal.clone(),
            decision,
        };
        let result = self.build(view, current_price, price_source, as_of, source);
        StrategyOutcome::Strategy(Box::new(result))
    }

    pub fn handle(&self, request: &StrategyRequest, as_of: NaiveDate) -> StrategyOutcome {
        match request {
            StrategyRequest::Text { text } => self.from_text(text, as_of),
            StrategyRequest::Signal {
                ticker,
                signal,
                style,
            } => self.from_signal(ticker, signal, style.as_deref(), as_of),
        }
    }

    fn resolve_price(&self, ticker: Option<&str>) -> (f64, PriceSource) {
        let fallback = (self.settings.fallback_price, PriceSource::Fallback);
        let Some(ticker) = ticker else {
            return fallback;
        };
        match self.quotes.current_price(ticker) {
            Ok(Some(p)) if is_usable_price(p) => (p, PriceSource::Quote),
            Ok(Some(p)) => {
                warn!("unusable quote {} for {}, using fallback price", p, ticker);
                fallback
            }
            Ok(None) => {
                warn!(
                    "no quote for {}, using fallback price {}",
                    ticker, self.settings.fallback_price
                );
                fallback
            }
            Err(e) => {
                warn!("quote lookup for {} failed: {:#}", ticker, e);
                fallback
            }
        }
    }

    fn build(
        &self,
        view: View<'_>,
        current_price: f64,
        price_source: PriceSource,
        as_of: NaiveDate,
        source: RequestSource,
    ) -> StrategyResult {
        let found = self
            .catalog
            .lookup(view.direction, view.strength, view.risk_profile);
        let ls = found.archetype.leg_structure;
        let bias = ls.bias();
        let expiry_days = view.timeframe.expiry_days();

        // Directional structures carry a primary leg worth binding and hedging.
        let leg_target = match (ls.primary_option_type(), view.leg_target) {
            (None, _) => None,
            (Some(ot), Some((want, strike))) if want == ot => Some((ot, strike)),
            (Some(ot), target) => {
                if let Some((want, _)) = target {
                    debug!("{} trades no {} leg, binding a {} at spot", ls, want, ot);
                }
                Some((ot, current_price))
            }
        };

        let bound_leg = match (view.ticker, leg_target) {
            (Some(t), Some((ot, strike))) => self.synth.bind_near(
                t,
                ot,
                current_price,
                strike,
                expiry_days,
                as_of,
                self.chain.as_ref(),
            ),
            _ => None,
        };

        let parameters = bound_leg
            .as_ref()
            .filter(|_| ls.accepts_bound_leg())
            .and_then(|leg| self.synth.from_bound_leg(ls, current_price, leg))
            .unwrap_or_else(|| self.synth.synthesize(ls, current_price, view.timeframe));

        let metrics = self.risk.metrics(&parameters);
        let payoff = self.settings.payoff.curve(&parameters).to_vec();

        let hedge = leg_target.map(|(ot, target_strike)| {
            let delta = match &bound_leg {
                Some(leg) if leg.delta.is_finite() && leg.delta != 0.0 => leg.delta,
                Some(leg) => proxy_delta(ot, leg.strike, current_price, leg.days_to_expiry),
                None => proxy_delta(ot, target_strike, current_price, i64::from(expiry_days)),
            };
            let direction = match bias {
                Direction::Bearish => HedgeDirection::Short,
                _ => HedgeDirection::Long,
            };
            let option_notional = parameters.equivalent_shares * current_price;
            self.hedger
                .hedge(option_notional, delta, current_price, direction)
        });

        info!(
            "Strategy {} for {} at {:.2} ({:?}, {:?})",
            ls,
            view.ticker.unwrap_or("-"),
            current_price,
            found.resolution,
            parameters.data_source
        );

        StrategyResult {
            ticker: view.ticker.map(str::to_string),
            source,
            narrative: found.archetype.render_narrative(view.ticker),
            archetype: found.archetype,
            catalog_resolution: found.resolution,
            current_price,
            price_source,
            parameters,
            metrics,
            payoff,
            bound_leg,
            hedge,
        }
    }
}

fn missing_fields(intent: &ParsedIntent) -> Vec<String> {
    let mut missing = Vec::new();
    if intent.ticker.is_none() {
        missing.push("ticker");
    }
    if intent.direction.is_none() {
        missing.push("direction");
    }
    if !intent.explicit.strength {
        missing.push("strength");
    }
    if !intent.explicit.timeframe {
        missing.push("timeframe");
    }
    if !intent.explicit.risk_profile {
        missing.push("riskProfile");
    }
    missing.into_iter().map(String::from).collect()
}
