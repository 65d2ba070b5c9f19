//! Entry point. Reads requests (arguments or stdin lines), prints each
//! strategy as JSON and appends it to the journal.

use std::{path::Path, sync::Arc};

use anyhow::Context;
use chrono::Local;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use option_strategy_synth::chain::{ChainDataProvider, ChainSnapshot, NoChain, StaticQuotes};
use option_strategy_synth::config::AppConfig;
use option_strategy_synth::engine::{EngineSettings, StrategyEngine, StrategyRequest};
use option_strategy_synth::intent::IntentExtractor;
use option_strategy_synth::journal::{self, StrategyJournal};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cfg_path =
        std::env::var("STRATEGY_SYNTH_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let cfg = if Path::new(&cfg_path).exists() {
        AppConfig::load(&cfg_path)?
    } else {
        info!("No config at {}, using defaults", cfg_path);
        AppConfig::default()
    };

    let chain: Arc<dyn ChainDataProvider> = match &cfg.data.chain_snapshot {
        Some(p) => Arc::new(
            ChainSnapshot::load(p)
                .with_context(|| format!("loading chain snapshot {}", p.display()))?,
        ),
        None => Arc::new(NoChain),
    };
    let quotes = Arc::new(StaticQuotes::new(cfg.data.quotes.clone()));
    let engine = StrategyEngine::new(
        EngineSettings::from(&cfg.engine),
        IntentExtractor::new(),
        chain,
        quotes,
    );

    let journal_path = cfg.journal.path.clone().unwrap_or_else(journal::default_path);
    let mut journal = StrategyJournal::load(&journal_path);
    info!(
        "Strategy synth ready. notional={}, fallback_price={}, style={}, journal={}",
        cfg.engine.notional,
        cfg.engine.fallback_price,
        cfg.engine.default_style,
        journal_path.display()
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let request = StrategyRequest::from_line(&args.join(" "));
        respond(&engine, &mut journal, request)?;
        return save_journal(&journal, &journal_path);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(l)) => l,
                    Ok(None) => break,
                    Err(e) => { error!("stdin read failed: {:#}", e); break; }
                };
                if line.trim().is_empty() {
                    continue;
                }
                let request = StrategyRequest::from_line(&line);
                if let Err(e) = respond(&engine, &mut journal, request) {
                    error!("request failed: {:#}", e);
                    continue;
                }
                if let Err(e) = journal.save(&journal_path) {
                    error!("journal save failed: {:#}", e);
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    save_journal(&journal, &journal_path)
}

fn respond(
    engine: &StrategyEngine,
    journal: &mut StrategyJournal,
    request: StrategyRequest,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let outcome = engine.handle(&request, today);
    let json = serde_json::to_string_pretty(&outcome).context("serializing outcome")?;
    println!("{}", json);
    journal.record(today, request, outcome);
    Ok(())
}

fn save_journal(journal: &StrategyJournal, path: &Path) -> anyhow::Result<()> {
    journal
        .save(path)
        .with_context(|| format!("saving journal {}", path.display()))?;
    info!("Journal saved ({} entries)", journal.entries.len());
    Ok(())
}
