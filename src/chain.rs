//! Market-data boundary: the option-chain and quote providers the engine
//! consumes, plus file- and config-backed implementations for the host.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::error::ProviderError;
use crate::types::OptionType;
use crate::utils::sanitize_symbol;

/// One contract row as delivered by a chain vendor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionQuote {
    #[serde(alias = "contractID")]
    pub contract_id: String,
    #[serde(rename = "type", alias = "optionType")]
    pub option_type: OptionType,
    #[serde(deserialize_with = "lenient_f64")]
    pub strike: f64,
    #[serde(alias = "expiration")]
    pub expiration_date: NaiveDate,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub delta: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub gamma: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub theta: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub vega: f64,
    #[serde(default, alias = "implied_volatility", deserialize_with = "lenient_f64")]
    pub implied_volatility: f64,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub mark: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub last: Option<f64>,
}

impl OptionQuote {
    /// Mark if the vendor has one, otherwise last trade. Zero or negative
    /// prices count as missing.
    pub fn premium(&self) -> Option<f64> {
        self.mark
            .filter(|p| p.is_finite() && *p > 0.0)
            .or(self.last.filter(|p| p.is_finite() && *p > 0.0))
    }
}

pub trait ChainDataProvider: Send + Sync {
    /// Full chain for `ticker`; empty when the vendor has nothing.
    fn option_chain(&self, ticker: &str) -> Result<Vec<OptionQuote>, ProviderError>;
}

pub trait QuoteProvider: Send + Sync {
    fn current_price(&self, ticker: &str) -> Result<Option<f64>, ProviderError>;
}

/// Provider with no data at all; every bind falls back to synthesis.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChain;

impl ChainDataProvider for NoChain {
    fn option_chain(&self, _ticker: &str) -> Result<Vec<OptionQuote>, ProviderError> {
        Ok(Vec::new())
    }
}

/// Chains keyed by upper-case ticker, typically loaded from a JSON snapshot
/// of the form `{"TSLA": [ {contract}, ... ]}`.
#[derive(Debug, Default, Clone)]
pub struct ChainSnapshot {
    chains: HashMap<String, Vec<OptionQuote>>,
}

impl ChainSnapshot {
    pub fn new(chains: HashMap<String, Vec<OptionQuote>>) -> Self {
        let chains = chains
            .into_iter()
            .map(|(k, v)| (sanitize_symbol(&k), v))
            .collect();
        Self { chains }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: HashMap<String, Vec<OptionQuote>> =
            serde_json::from_str(&s).map_err(|source| ProviderError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let snap = Self::new(raw);
        info!(
            "Loaded chain snapshot {} ({} tickers, {} contracts)",
            path.display(),
            snap.chains.len(),
            snap.chains.values().map(Vec::len).sum::<usize>()
        );
        Ok(snap)
    }

    pub fn insert(&mut self, ticker: &str, quotes: Vec<OptionQuote>) {
        self.chains.insert(sanitize_symbol(ticker), quotes);
    }
}

impl ChainDataProvider for ChainSnapshot {
    fn option_chain(&self, ticker: &str) -> Result<Vec<OptionQuote>, ProviderError> {
        Ok(self
            .chains
            .get(&sanitize_symbol(ticker))
            .cloned()
            .unwrap_or_default())
    }
}

/// Fixed spot prices, usually from the `data.quotes` config map.
#[derive(Debug, Default, Clone)]
pub struct StaticQuotes {
    prices: HashMap<String, f64>,
}

impl StaticQuotes {
    pub fn new(prices: HashMap<String, f64>) -> Self {
        let prices = prices
            .into_iter()
            .map(|(k, v)| (sanitize_symbol(&k), v))
            .collect();
        Self { prices }
    }
}

impl QuoteProvider for StaticQuotes {
    fn current_price(&self, ticker: &str) -> Result<Option<f64>, ProviderError> {
        Ok(self.prices.get(&sanitize_symbol(ticker)).copied())
    }
}

// Vendors quote numbers as strings ("185.00") about as often as not.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrText {
    Num(f64),
    Text(String),
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    match NumOrText::deserialize(d)? {
        NumOrText::Num(v) => Ok(v),
        NumOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("bad number {:?}: {}", s, e))),
    }
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Option::<NumOrText>::deserialize(d)? {
        None => Ok(None),
        Some(NumOrText::Num(v)) => Ok(Some(v)),
        Some(NumOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumOrText::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("bad number {:?}: {}", s, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VENDOR_ROW: &str = r#"{
        "contractID": "AAPL250117C00185000",
        "type": "call",
        "strike": "185.00",
        "expiration": "2025-01-17",
        "delta": "0.5607",
        "gamma": 0.02,
        "theta": "-0.05",
        "vega": "0.31",
        "implied_volatility": "0.27",
        "mark": "8.50",
        "last": "8.45"
    }"#;

    #[test]
    fn vendor_row_with_text_numbers() {
        let q: OptionQuote = serde_json::from_str(VENDOR_ROW).unwrap();
        assert_eq!(q.contract_id, "AAPL250117C00185000");
        assert_eq!(q.option_type, OptionType::Call);
        assert_eq!(q.strike, 185.0);
        assert_eq!(q.expiration_date, NaiveDate::from_ymd_opt(2025, 1, 17).unwrap());
        assert!((q.delta - 0.5607).abs() < 1e-12);
        assert_eq!(q.premium(), Some(8.50));
    }

    #[test]
    fn premium_falls_back_to_last_and_never_invents() {
        let mut q: OptionQuote = serde_json::from_str(VENDOR_ROW).unwrap();
        q.mark = Some(0.0);
        assert_eq!(q.premium(), Some(8.45));
        q.last = None;
        assert_eq!(q.premium(), None);
    }

    #[test]
    fn uppercase_type_and_missing_greeks() {
        let q: OptionQuote = serde_json::from_str(
            r#"{"contractId":"X","type":"PUT","strike":90,"expirationDate":"2025-03-21"}"#,
        )
        .unwrap();
        assert_eq!(q.option_type, OptionType::Put);
        assert_eq!(q.delta, 0.0);
        assert_eq!(q.premium(), None);
    }

    #[test]
    fn snapshot_loads_and_normalizes_tickers() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{{\"aapl\": [{}]}}", VENDOR_ROW).unwrap();
        let snap = ChainSnapshot::load(f.path()).unwrap();
        assert_eq!(snap.option_chain("AAPL").unwrap().len(), 1);
        assert_eq!(snap.option_chain(" aapl ").unwrap().len(), 1);
        assert!(snap.option_chain("TSLA").unwrap().is_empty());
    }

    #[test]
    fn snapshot_errors_are_typed() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        assert!(matches!(
            ChainSnapshot::load(f.path()),
            Err(ProviderError::Parse { .. })
        ));
        assert!(matches!(
            ChainSnapshot::load("/definitely/not/here.json"),
            Err(ProviderError::Io { .. })
        ));
    }

    #[test]
    fn static_quotes_lookup() {
        let q = StaticQuotes::new(HashMap::from([("tsla".to_string(), 250.0)]));
        assert_eq!(q.current_price("TSLA").unwrap(), Some(250.0));
        assert_eq!(q.current_price("AAPL").unwrap(), None);
    }
}
