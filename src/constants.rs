//! Cross-cutting, shared constants.
//!
//! The special-token spellings and the boundary marker describe the
//! XLM-RoBERTa family of vocabularies that the bundled tokenizer targets.
//! Artifacts may override the marker through their pre-tokenizer section.

/// Default maximum sequence length for cross-encoder inputs.
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Default model identifier reported by [`crate::Reranker::model_name`].
pub const DEFAULT_MODEL_NAME: &str = "BAAI/bge-reranker-large";

/// Default per-request timeout for the remote strategy, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upper bound accepted for `CROSSRANK_TIMEOUT_SECS` (one day).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Default relevance threshold used by `rerank_with_threshold`.
pub const DEFAULT_THRESHOLD: f64 = 0.0;

/// Word-boundary glyph prepended to every pre-token.
pub const BOUNDARY_MARKER: char = '\u{2581}';

/// Text inserted between query and passage by `encode_pair`.
pub const PAIR_SEPARATOR: &str = " </s> ";

pub const BEGIN_TOKEN: &str = "<s>";
pub const END_TOKEN: &str = "</s>";
pub const PAD_TOKEN: &str = "<pad>";
pub const UNKNOWN_TOKEN: &str = "<unk>";
pub const MASK_TOKEN: &str = "<mask>";

/// File names expected inside a model directory.
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const MODEL_CONFIG_FILE: &str = "config.json";
pub const MODEL_WEIGHTS_FILE: &str = "model.safetensors";

/// Remote endpoint paths, relative to the configured base URL.
pub const REMOTE_PAIRS_PATH: &str = "/rerank";
pub const REMOTE_TENSORS_PATH: &str = "/inference";

/// Timeout used by the remote reachability probe in `health`.
pub const HEALTH_PROBE_TIMEOUT_SECS: u64 = 5;
