//! Append-only record of requests and the strategies produced for them.

use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

use crate::engine::{StrategyOutcome, StrategyRequest};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub recorded_on: NaiveDate,
    pub input: StrategyRequest,
    pub outcome: StrategyOutcome,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StrategyJournal {
    pub entries: Vec<JournalEntry>,
}

/// `journal.json` under the platform data dir, or the working directory if
/// no home directory can be found.
pub fn default_path() -> PathBuf {
    ProjectDirs::from("io", "strategy-synth", "strategy-synth")
        .map(|d| d.data_dir().join("journal.json"))
        .unwrap_or_else(|| PathBuf::from("data/journal.json"))
}

impl StrategyJournal {
    /// Missing or unreadable journals start empty.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(s) => match serde_json::from_str::<Self>(&s) {
                    Ok(me) => return me,
                    Err(e) => warn!("journal {} is corrupt, starting fresh: {}", path.display(), e),
                },
                Err(e) => warn!("journal {} unreadable: {}", path.display(), e),
            }
        }
        Self::default()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let s = serde_json::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }

    pub fn record(
        &mut self,
        recorded_on: NaiveDate,
        input: StrategyRequest,
        outcome: StrategyOutcome,
    ) {
        self.entries.push(JournalEntry {
            recorded_on,
            input,
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{NoChain, StaticQuotes};
    use crate::engine::{EngineSettings, StrategyEngine};
    use crate::intent::IntentExtractor;
    use std::sync::Arc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/journal.json");
        let engine = StrategyEngine::new(
            EngineSettings::default(),
            IntentExtractor::new(),
            Arc::new(NoChain),
            Arc::new(StaticQuotes::default()),
        );

        let mut j = StrategyJournal::load(&path);
        assert!(j.entries.is_empty());
        for line in ["苹果短期看跌", "hello"] {
            let req = StrategyRequest::from_line(line);
            let out = engine.handle(&req, day());
            j.record(day(), req, out);
        }
        j.save(&path).unwrap();

        let back = StrategyJournal::load(&path);
        assert_eq!(back.entries.len(), 2);
        assert_eq!(back.entries[0].input, j.entries[0].input);
        assert!(matches!(
            back.entries[0].outcome,
            StrategyOutcome::Strategy(_)
        ));
        assert!(matches!(
            back.entries[1].outcome,
            StrategyOutcome::NeedMoreInformation { .. }
        ));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(StrategyJournal::load(&path).entries.is_empty());
    }
}
