//! Query/document reranking.
//!
//! A [`Reranker`] scores every document against a query, then returns the
//! documents ordered by relevance. Scores come from one of two strategies,
//! chosen at construction:
//!
//! - [`LocalScorer`]: built-in tokenizer plus a native [`InferenceSession`];
//! - [`RemoteScorer`]: an HTTP scoring service.
//!
//! Both honor a [`RerankContext`]: a cancelled or expired context fails the
//! call with an interruption error, never with partial results.

pub mod error;
pub mod local;
pub mod remote;
pub mod select;
pub mod types;
pub mod wire;


pub use error::{RemoteServiceError, RerankError, TransportError};
pub use local::LocalScorer;
pub use remote::{RemoteMode, RemoteScorer};
pub use select::select_top_k;
pub use types::RerankResult;

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{RerankerConfig, StrategyKind};
use crate::constants::{DEFAULT_MODEL_NAME, DEFAULT_THRESHOLD};
use crate::context::RerankContext;
use crate::inference::{InferenceSession, SessionConfig};
use crate::tokenizer::Tokenizer;

/// Scoring backend, fixed for the lifetime of a [`Reranker`].
#[derive(Debug)]
pub enum RerankStrategy {
    Local(LocalScorer),
    Remote(RemoteScorer),
}

impl RerankStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            RerankStrategy::Local(_) => "local",
            RerankStrategy::Remote(_) => "remote",
        }
    }
}

#[derive(Debug)]
pub struct Reranker {
    strategy: RerankStrategy,
    model_name: String,
    threshold: f64,
}

impl Reranker {
    pub fn new(strategy: RerankStrategy) -> Self {
        Self {
            strategy,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Local strategy over an already-built tokenizer and session.
    pub fn local(tokenizer: Tokenizer, session: Arc<InferenceSession>, max_length: usize) -> Self {
        Self::new(RerankStrategy::Local(LocalScorer::new(
            tokenizer, session, max_length,
        )))
    }

    pub fn remote(scorer: RemoteScorer) -> Self {
        Self::new(RerankStrategy::Remote(scorer))
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    /// Default cut-off used by [`Self::rerank_above_threshold`].
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Validates `config`, loads whatever the strategy needs and returns a
    /// ready reranker.
    pub fn from_config(config: &RerankerConfig) -> Result<Self, RerankError> {
        config
            .validate()
            .map_err(|e| RerankError::InvalidConfig {
                reason: e.to_string(),
            })?;

        let strategy = match config.strategy {
            StrategyKind::Local => {
                let model_path = config
                    .model_path
                    .clone()
                    .ok_or_else(|| RerankError::InvalidConfig {
                        reason: "local strategy requires a model path".to_string(),
                    })?;
                let tokenizer =
                    Tokenizer::load(config.tokenizer_path.as_ref().unwrap_or(&model_path))?;
                let session = InferenceSession::open(SessionConfig::new(model_path))?;

                RerankStrategy::Local(LocalScorer::new(
                    tokenizer,
                    Arc::new(session),
                    config.max_length,
                ))
            }
            StrategyKind::Remote => {
                let url = config
                    .remote_url
                    .clone()
                    .ok_or_else(|| RerankError::InvalidConfig {
                        reason: "remote strategy requires a URL".to_string(),
                    })?;

                let scorer = match config.remote_mode {
                    RemoteMode::Pairs => RemoteScorer::pairs(url, config.timeout)?,
                    RemoteMode::Tensors => {
                        let source = config.tokenizer_source().ok_or_else(|| {
                            RerankError::InvalidConfig {
                                reason: "tensor mode requires a tokenizer path".to_string(),
                            }
                        })?;
                        let tokenizer = Tokenizer::load(source)?;
                        RemoteScorer::tensors(url, tokenizer, config.max_length, config.timeout)?
                    }
                };
                RerankStrategy::Remote(scorer)
            }
        };

        info!(
            strategy = strategy.name(),
            model = %config.model_name,
            max_length = config.max_length,
            "Reranker ready"
        );

        Ok(Self::new(strategy)
            .with_model_name(config.model_name.clone())
            .with_threshold(config.threshold))
    }

    /// Scores `documents` against `query` and returns them best first.
    ///
    /// `top_k == 0` or `top_k >= documents.len()` returns every document;
    /// otherwise exactly `top_k`. Empty `documents` returns an empty list
    /// without scoring anything.
    pub async fn rerank<S: AsRef<str>>(
        &self,
        ctx: &RerankContext,
        query: &str,
        documents: &[S],
        top_k: usize,
    ) -> Result<Vec<RerankResult>, RerankError> {
        if documents.is_empty() {
            debug!("Rerank called with no documents");
            return Ok(Vec::new());
        }

        let documents: Vec<String> = documents.iter().map(|d| d.as_ref().to_string()).collect();

        debug!(
            strategy = self.strategy.name(),
            query_len = query.len(),
            num_documents = documents.len(),
            top_k,
            "Reranking documents"
        );

        let scores = match &self.strategy {
            RerankStrategy::Local(scorer) => scorer.score(ctx, query, &documents).await?,
            RerankStrategy::Remote(scorer) => scorer.score(ctx, query, &documents).await?,
        };

        let results = documents
            .into_iter()
            .zip(scores)
            .enumerate()
            .map(|(index, (document, score))| RerankResult::new(index, document, score))
            .collect();

        let ranked = select_top_k(results, top_k);

        debug!(
            top_score = ranked.first().map(|r| r.score),
            returned = ranked.len(),
            "Reranking complete"
        );

        Ok(ranked)
    }

    /// Like [`Self::rerank`], then drops results scoring at or below
    /// `threshold`. The cut happens after top-K selection.
    pub async fn rerank_with_threshold<S: AsRef<str>>(
        &self,
        ctx: &RerankContext,
        query: &str,
        documents: &[S],
        top_k: usize,
        threshold: f64,
    ) -> Result<Vec<RerankResult>, RerankError> {
        let ranked = self.rerank(ctx, query, documents, top_k).await?;
        let total = ranked.len();

        let filtered: Vec<_> = ranked
            .into_iter()
            .filter(|result| result.score > threshold)
            .collect();

        debug!(
            threshold,
            hits = filtered.len(),
            total,
            "Filtered by threshold"
        );

        Ok(filtered)
    }

    /// [`Self::rerank_with_threshold`] using the configured threshold.
    pub async fn rerank_above_threshold<S: AsRef<str>>(
        &self,
        ctx: &RerankContext,
        query: &str,
        documents: &[S],
        top_k: usize,
    ) -> Result<Vec<RerankResult>, RerankError> {
        self.rerank_with_threshold(ctx, query, documents, top_k, self.threshold)
            .await
    }

    /// Reports whether the backend can score. Does not change any state.
    pub async fn health(&self) -> Result<(), RerankError> {
        match &self.strategy {
            RerankStrategy::Local(scorer) => {
                if scorer.session().is_initialized() {
                    Ok(())
                } else {
                    Err(RerankError::NotReady {
                        reason: "inference session not initialized".to_string(),
                    })
                }
            }
            RerankStrategy::Remote(scorer) => scorer.health().await,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn strategy(&self) -> &RerankStrategy {
        &self.strategy
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Sequence length used when encoding; `0` for remote pair mode, where
    /// the service tokenizes.
    pub fn max_length(&self) -> usize {
        match &self.strategy {
            RerankStrategy::Local(scorer) => scorer.max_length(),
            RerankStrategy::Remote(scorer) => scorer.max_length(),
        }
    }

    /// Releases the local session. A no-op for the remote strategy.
    pub fn close(&self) -> Result<(), RerankError> {
        match &self.strategy {
            RerankStrategy::Local(scorer) => {
                scorer.session().close()?;
                Ok(())
            }
            RerankStrategy::Remote(_) => Ok(()),
        }
    }
}
