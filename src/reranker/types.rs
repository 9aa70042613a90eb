use serde::{Deserialize, Serialize};

/// One scored document.
///
/// `relevance_score` mirrors `score` for consumers that expect the field
/// under that name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankResult {
    /// Position of the document in the caller's input.
    pub index: usize,
    pub document: String,
    /// Relevance probability in `[0, 1]`.
    pub score: f64,
    pub relevance_score: f64,
}

impl RerankResult {
    pub fn new(index: usize, document: impl Into<String>, score: f64) -> Self {
        Self {
            index,
            document: document.into(),
            score,
            relevance_score: score,
        }
    }
}
