//! Load runtime configuration.

use anyhow::Context;
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path, path::PathBuf};

use crate::engine::EngineSettings;
use crate::payoff::PayoffEngine;
use crate::synth::BindWindow;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineCfg {
    pub notional: f64,
    pub fallback_price: f64,
    pub min_confidence: f64,
    pub payoff_steps: usize,
    pub grid_low: f64, // fraction of spot
    pub grid_high: f64,
    pub default_style: String, // aggressive | balanced | conservative, or an alias
    pub expiry_window_days: i64,
    pub strike_window_pct: f64,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            notional: 30_000.0,
            fallback_price: 300.0,
            min_confidence: 0.3,
            payoff_steps: 100,
            grid_low: 0.7,
            grid_high: 1.3,
            default_style: "balanced".into(),
            expiry_window_days: 30,
            strike_window_pct: 0.20,
        }
    }
}

impl From<&EngineCfg> for EngineSettings {
    fn from(c: &EngineCfg) -> Self {
        EngineSettings {
            notional: c.notional,
            fallback_price: c.fallback_price,
            min_confidence: c.min_confidence,
            payoff: PayoffEngine {
                grid_low: c.grid_low,
                grid_high: c.grid_high,
                steps: c.payoff_steps,
            },
            bind_window: BindWindow {
                expiry_days: c.expiry_window_days,
                strike_pct: c.strike_window_pct,
            },
            default_style: c.default_style.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DataCfg {
    /// JSON file of `{TICKER: [contracts]}`; no chain data when absent.
    pub chain_snapshot: Option<PathBuf>,
    pub quotes: HashMap<String, f64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct JournalCfg {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineCfg,
    pub data: DataCfg,
    pub journal: JournalCfg,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Self = serde_yaml::from_str(&s)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let e = &self.engine;
        if !(e.fallback_price.is_finite() && e.fallback_price > 0.0) {
            anyhow::bail!("engine.fallback_price must be positive, got {}", e.fallback_price);
        }
        if !(e.grid_low > 0.0 && e.grid_low <= e.grid_high) {
            anyhow::bail!(
                "engine.grid_low/grid_high must satisfy 0 < low <= high, got {}/{}",
                e.grid_low,
                e.grid_high
            );
        }
        if e.expiry_window_days < 0 || e.strike_window_pct < 0.0 {
            anyhow::bail!("engine bind windows must be non-negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_takes_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "engine:\n  notional: 50000\n  default_style: buffett\ndata:\n  quotes:\n    TSLA: 251.3\n"
        )
        .unwrap();
        let cfg = AppConfig::load(f.path()).unwrap();
        assert_eq!(cfg.engine.notional, 50_000.0);
        assert_eq!(cfg.engine.fallback_price, 300.0);
        assert_eq!(cfg.engine.payoff_steps, 100);
        assert_eq!(cfg.data.quotes.get("TSLA"), Some(&251.3));
        assert!(cfg.data.chain_snapshot.is_none());
        assert!(cfg.journal.path.is_none());

        let s = EngineSettings::from(&cfg.engine);
        assert_eq!(s.default_style, "buffett");
        assert_eq!(s.bind_window.expiry_days, 30);
    }

    #[test]
    fn rejects_bad_grid() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "engine:\n  grid_low: 1.5\n  grid_high: 1.2\n").unwrap();
        assert!(AppConfig::load(f.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(AppConfig::load("/no/such/config.yaml").is_err());
    }
}
