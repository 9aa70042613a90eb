//! Crossrank library crate (used by the CLI binary and integration tests).
//!
//! Cross-encoder reranking: given a query and candidate documents, score
//! every `(query, document)` pair for relevance and return the documents
//! best first.
//!
//! # Public API Surface
//!
//! ## Reranking
//! - [`Reranker`], [`RerankStrategy`] - Orchestration over local or remote scoring
//! - [`RerankResult`], [`select_top_k`] - Ranked output
//! - [`RerankContext`] - Per-call cancellation and deadline
//!
//! ## Building Blocks
//! - [`Tokenizer`], [`VocabularyStore`], [`EncodedSequence`] - Subword encoding
//! - [`InferenceSession`], [`SessionConfig`] - Native cross-encoder session
//! - [`RemoteScorer`], [`RemoteMode`] - HTTP scoring service client
//!
//! ## Configuration
//! - [`RerankerConfig`], [`ConfigError`] - `CROSSRANK_*` environment settings
//!
//! ## Errors
//! Each layer has its own `thiserror` enum; [`RerankError`] wraps them at
//! the orchestration boundary.

pub mod config;
pub mod constants;
pub mod context;
pub mod inference;
pub mod reranker;
pub mod tokenizer;

pub use config::{ConfigError, RerankerConfig, StrategyKind};
pub use context::{ContextError, RerankContext};
pub use inference::{
    DevicePreference, InferenceError, InferenceSession, SessionConfig, SessionError, sigmoid,
};
pub use reranker::{
    LocalScorer, RemoteMode, RemoteScorer, RemoteServiceError, RerankError, RerankResult,
    RerankStrategy, Reranker, TransportError, select_top_k,
};
pub use tokenizer::{
    ConfigLoadError, EncodedSequence, SpecialTokens, Tokenizer, VocabularyStore,
};
