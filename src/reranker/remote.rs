use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::constants::{HEALTH_PROBE_TIMEOUT_SECS, REMOTE_PAIRS_PATH, REMOTE_TENSORS_PATH};
use crate::context::RerankContext;
use crate::tokenizer::Tokenizer;

use super::error::{RemoteServiceError, RerankError, TransportError};
use super::wire::{PairsRequest, ScoreResponse, TensorsRequest};

/// Longest response body kept in a status error.
const MAX_ERROR_BODY: usize = 512;

/// What the remote service is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteMode {
    /// Raw `(query, document)` text; the service tokenizes.
    #[default]
    Pairs,
    /// Locally encoded id/mask rows.
    Tensors,
}

impl RemoteMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pairs" | "pair" | "text" => Some(RemoteMode::Pairs),
            "tensors" | "tensor" | "inference" => Some(RemoteMode::Tensors),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteMode::Pairs => "pairs",
            RemoteMode::Tensors => "tensors",
        }
    }
}

/// Scores through an HTTP scoring service.
pub struct RemoteScorer {
    client: reqwest::Client,
    base_url: String,
    mode: RemoteMode,
    tokenizer: Option<Tokenizer>,
    max_length: usize,
    timeout: Duration,
}

impl std::fmt::Debug for RemoteScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteScorer")
            .field("base_url", &self.base_url)
            .field("mode", &self.mode)
            .field("max_length", &self.max_length)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RemoteScorer {
    /// Pair mode: the service receives raw text.
    pub fn pairs(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        Self::build(base_url.into(), RemoteMode::Pairs, None, 0, timeout)
    }

    /// Tensor mode: documents are encoded with `tokenizer` before sending.
    pub fn tensors(
        base_url: impl Into<String>,
        tokenizer: Tokenizer,
        max_length: usize,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        Self::build(
            base_url.into(),
            RemoteMode::Tensors,
            Some(tokenizer),
            max_length,
            timeout,
        )
    }

    fn build(
        base_url: String,
        mode: RemoteMode,
        tokenizer: Option<Tokenizer>,
        max_length: usize,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            mode,
            tokenizer,
            max_length,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn mode(&self) -> RemoteMode {
        self.mode
    }

    /// Sequence length used in tensor mode; `0` in pair mode.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Scores every document against `query`, in input order.
    ///
    /// Both wire modes send `normalize: true`, so returned scores must be
    /// probabilities; anything outside `[0, 1]` is a malformed response.
    pub async fn score(
        &self,
        ctx: &RerankContext,
        query: &str,
        documents: &[String],
    ) -> Result<Vec<f64>, RerankError> {
        ctx.check().map_err(TransportError::Interrupted)?;

        match (self.mode, &self.tokenizer) {
            (RemoteMode::Tensors, Some(tokenizer)) => {
                let request = self.encode(ctx, tokenizer, query, documents).await?;
                self.post(ctx, REMOTE_TENSORS_PATH, &request, documents.len())
                    .await
            }
            (RemoteMode::Tensors, None) => Err(RerankError::NotReady {
                reason: "tensor mode requires a tokenizer".to_string(),
            }),
            (RemoteMode::Pairs, _) => {
                let request = PairsRequest::new(query, documents);
                self.post(ctx, REMOTE_PAIRS_PATH, &request, documents.len())
                    .await
            }
        }
    }

    /// Encodes the batch on the blocking pool, released early if `ctx` fires.
    async fn encode(
        &self,
        ctx: &RerankContext,
        tokenizer: &Tokenizer,
        query: &str,
        documents: &[String],
    ) -> Result<TensorsRequest, TransportError> {
        let tokenizer = tokenizer.clone();
        let query = query.to_string();
        let documents = documents.to_vec();
        let max_length = self.max_length;

        let task = tokio::task::spawn_blocking(move || {
            tokenizer
                .encode_pairs(&query, &documents, max_length)
                .into_iter()
                .collect::<TensorsRequest>()
        });

        tokio::select! {
            reason = ctx.done() => Err(TransportError::Interrupted(reason)),
            joined = task => joined.map_err(|e| TransportError::Encode {
                reason: e.to_string(),
            }),
        }
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        ctx: &RerankContext,
        path: &str,
        body: &T,
        expected: usize,
    ) -> Result<Vec<f64>, RerankError> {
        let endpoint = self.endpoint(path);
        let request = self.client.post(&endpoint).json(body);

        debug!(endpoint = %endpoint, documents = expected, "Sending remote scoring request");

        let response = tokio::select! {
            reason = ctx.done() => return Err(TransportError::Interrupted(reason).into()),
            sent = request.send() => sent.map_err(|e| TransportError::from_reqwest(&endpoint, e))?,
        };

        let status = response.status();
        let body = tokio::select! {
            reason = ctx.done() => return Err(TransportError::Interrupted(reason).into()),
            text = response.text() => text.map_err(|e| TransportError::from_reqwest(&endpoint, e))?,
        };

        if !status.is_success() {
            warn!(endpoint = %endpoint, status = status.as_u16(), "Scoring service rejected request");
            return Err(RemoteServiceError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            }
            .into());
        }

        let parsed: ScoreResponse =
            serde_json::from_str(&body).map_err(|e| RemoteServiceError::MalformedResponse {
                reason: e.to_string(),
            })?;

        if let Some(message) = parsed.failure() {
            warn!(endpoint = %endpoint, error = message, "Scoring service reported an error");
            return Err(RemoteServiceError::Service {
                message: message.to_string(),
            }
            .into());
        }

        let scores = parsed.scores.unwrap_or_default();
        if scores.len() != expected {
            return Err(RemoteServiceError::ScoreCountMismatch {
                expected,
                actual: scores.len(),
            }
            .into());
        }

        if let Some((index, score)) = scores
            .iter()
            .enumerate()
            .find(|(_, score)| !(0.0..=1.0).contains(*score))
        {
            warn!(endpoint = %endpoint, index, score, "Scoring service returned an unnormalized score");
            return Err(RemoteServiceError::MalformedResponse {
                reason: format!("score {score} at index {index} is outside [0, 1]"),
            }
            .into());
        }

        Ok(scores)
    }

    /// Reachability probe: any HTTP response from the base URL counts.
    pub async fn health(&self) -> Result<(), RerankError> {
        self.client
            .get(&self.base_url)
            .timeout(Duration::from_secs(HEALTH_PROBE_TIMEOUT_SECS).min(self.timeout))
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&self.base_url, e))?;
        Ok(())
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}
