use std::path::PathBuf;
use thiserror::Error;

/// Failure to load the vocabulary/merge artifact (`tokenizer.json`).
///
/// A structurally valid document with missing sections is not an error: it
/// produces empty tables and degraded tokenization instead.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read vocabulary artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse vocabulary artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
