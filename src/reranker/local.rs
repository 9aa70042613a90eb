use std::sync::Arc;

use tracing::debug;

use crate::context::RerankContext;
use crate::inference::{InferenceError, InferenceSession};
use crate::tokenizer::Tokenizer;

use super::error::RerankError;

/// In-process scoring: tokenize, then run the native session.
pub struct LocalScorer {
    tokenizer: Tokenizer,
    session: Arc<InferenceSession>,
    max_length: usize,
}

impl std::fmt::Debug for LocalScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalScorer")
            .field("vocab_size", &self.tokenizer.vocabulary().len())
            .field("session", &self.session)
            .field("max_length", &self.max_length)
            .finish()
    }
}

impl LocalScorer {
    pub fn new(tokenizer: Tokenizer, session: Arc<InferenceSession>, max_length: usize) -> Self {
        Self {
            tokenizer,
            session,
            max_length,
        }
    }

    pub fn session(&self) -> &Arc<InferenceSession> {
        &self.session
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Scores every document against `query`, in input order.
    ///
    /// Encoding and inference run on the blocking pool. The caller is released
    /// as soon as `ctx` fires; the blocking task stops at its next item.
    pub async fn score(
        &self,
        ctx: &RerankContext,
        query: &str,
        documents: &[String],
    ) -> Result<Vec<f64>, RerankError> {
        ctx.check()?;

        let tokenizer = self.tokenizer.clone();
        let session = Arc::clone(&self.session);
        let task_ctx = ctx.clone();
        let query = query.to_string();
        let documents = documents.to_vec();
        let max_length = self.max_length;

        let task = tokio::task::spawn_blocking(move || {
            let batch = tokenizer.encode_pairs(&query, &documents, max_length);
            debug!(batch_size = batch.len(), max_length, "Encoded rerank batch");
            session.run_inference_with_context(&batch, &task_ctx)
        });

        let scores = tokio::select! {
            reason = ctx.done() => return Err(reason.into()),
            joined = task => joined.map_err(|e| InferenceError::TaskFailed {
                reason: e.to_string(),
            })??,
        };

        Ok(scores)
    }
}
