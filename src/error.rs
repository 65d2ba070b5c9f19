//! Errors raised by market-data collaborators.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed chain snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{provider} unavailable for {ticker}: {reason}")]
    Unavailable {
        provider: &'static str,
        ticker: String,
        reason: String,
    },
}
