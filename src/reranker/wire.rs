//! JSON bodies exchanged with a remote scoring service.
//!
//! Pair mode posts raw `(query, document)` text to `/rerank`; tensor mode
//! tokenizes locally and posts the encoded batch to `/inference`. Both reply
//! with a [`ScoreResponse`].

use serde::{Deserialize, Serialize};

use crate::tokenizer::EncodedSequence;

/// `POST /rerank` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairsRequest {
    pub pairs: Vec<[String; 2]>,
    /// Asks the service to return probabilities rather than raw logits.
    #[serde(default)]
    pub normalize: bool,
}

impl PairsRequest {
    pub fn new<S: AsRef<str>>(query: &str, documents: &[S]) -> Self {
        Self {
            pairs: documents
                .iter()
                .map(|doc| [query.to_string(), doc.as_ref().to_string()])
                .collect(),
            normalize: true,
        }
    }
}

/// `POST /inference` body: one row per document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorsRequest {
    pub input_ids: Vec<Vec<i64>>,
    pub attention_mask: Vec<Vec<i64>>,
    pub token_type_ids: Vec<Vec<i64>>,
    #[serde(default)]
    pub normalize: bool,
}

impl TensorsRequest {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

impl FromIterator<EncodedSequence> for TensorsRequest {
    fn from_iter<I: IntoIterator<Item = EncodedSequence>>(iter: I) -> Self {
        let mut request = Self {
            normalize: true,
            ..Self::default()
        };
        for sequence in iter {
            request.input_ids.push(sequence.input_ids);
            request.attention_mask.push(sequence.attention_mask);
            request.token_type_ids.push(sequence.token_type_ids);
        }
        request
    }
}

/// Reply from either endpoint. A non-empty `error` overrides `scores`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    #[serde(default)]
    pub scores: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoreResponse {
    pub fn scores(scores: Vec<f64>) -> Self {
        Self {
            scores: Some(scores),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            scores: Some(Vec::new()),
            error: Some(message.into()),
        }
    }

    /// The service-reported failure, if any.
    pub fn failure(&self) -> Option<&str> {
        self.error.as_deref().filter(|message| !message.is_empty())
    }
}
