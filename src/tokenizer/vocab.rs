use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::constants::{
    BEGIN_TOKEN, BOUNDARY_MARKER, END_TOKEN, MASK_TOKEN, PAD_TOKEN, UNKNOWN_TOKEN,
};

use super::artifact::{TokenizerArtifact, VocabSpec};
use super::error::ConfigLoadError;

/// Ids of the special tokens the encoder relies on.
///
/// Tokens missing from the artifact fall back to id `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecialTokens {
    pub begin: i64,
    pub end: i64,
    pub pad: i64,
    pub unknown: i64,
    pub mask: i64,
}

/// Immutable token/id and merge-rank tables.
///
/// Built once from the artifact and never mutated afterwards, so a single
/// instance can be shared across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct VocabularyStore {
    token_to_id: HashMap<String, i64>,
    id_to_token: HashMap<i64, String>,
    added: HashMap<String, i64>,
    // left -> right -> rank; nested so lookups borrow instead of allocating a key
    merges: HashMap<String, HashMap<String, usize>>,
    merge_count: usize,
    specials: SpecialTokens,
    boundary_marker: char,
    model_kind: Option<String>,
}

impl VocabularyStore {
    /// Reads and parses a `tokenizer.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, path.to_path_buf())
    }

    /// Parses an in-memory artifact.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigLoadError> {
        Self::parse(raw, PathBuf::from("<inline>"))
    }

    fn parse(raw: &str, path: PathBuf) -> Result<Self, ConfigLoadError> {
        let artifact: TokenizerArtifact =
            serde_json::from_str(raw).map_err(|source| ConfigLoadError::Parse { path, source })?;
        Ok(Self::from_artifact(artifact))
    }

    /// Builds the tables from an already-deserialized artifact.
    pub fn from_artifact(artifact: TokenizerArtifact) -> Self {
        let mut token_to_id = HashMap::new();
        let mut id_to_token = HashMap::new();
        let mut added = HashMap::new();

        for token in &artifact.added_tokens {
            added.insert(token.content.clone(), token.id);
            id_to_token.insert(token.id, token.content.clone());
        }

        let model = artifact.model.unwrap_or_default();

        match model.vocab {
            Some(VocabSpec::Scored(entries)) => {
                // weights are only meaningful to unigram decoding, which is not performed
                for (position, (token, _weight)) in entries.into_iter().enumerate() {
                    let id = position as i64;
                    id_to_token.insert(id, token.clone());
                    token_to_id.insert(token, id);
                }
            }
            Some(VocabSpec::Indexed(entries)) => {
                for (token, id) in entries {
                    id_to_token.insert(id, token.clone());
                    token_to_id.insert(token, id);
                }
            }
            None => {}
        }

        let mut merges: HashMap<String, HashMap<String, usize>> = HashMap::new();
        let mut merge_count = 0;
        let mut skipped = 0usize;
        for (rank, rule) in model.merges.iter().enumerate() {
            let Some((left, right)) = rule.halves() else {
                skipped += 1;
                continue;
            };
            // a repeated rule keeps its first (highest-priority) rank
            let slot = merges
                .entry(left.to_string())
                .or_default()
                .entry(right.to_string());
            if let std::collections::hash_map::Entry::Vacant(vacant) = slot {
                vacant.insert(rank);
                merge_count += 1;
            }
        }
        if skipped > 0 {
            warn!(skipped, "Ignoring malformed merge rules");
        }

        let lookup = |content: &str| {
            added
                .get(content)
                .or_else(|| token_to_id.get(content))
                .copied()
        };
        let specials = SpecialTokens {
            begin: lookup(BEGIN_TOKEN).unwrap_or(0),
            end: lookup(END_TOKEN).unwrap_or(0),
            pad: lookup(PAD_TOKEN).unwrap_or(0),
            unknown: lookup(UNKNOWN_TOKEN).or(model.unk_id).unwrap_or(0),
            mask: lookup(MASK_TOKEN).unwrap_or(0),
        };

        let boundary_marker = artifact
            .pre_tokenizer
            .as_ref()
            .and_then(|p| p.boundary_marker())
            .unwrap_or(BOUNDARY_MARKER);

        debug!(
            vocab_size = token_to_id.len(),
            added_tokens = added.len(),
            merges = merge_count,
            model_kind = model.kind.as_deref().unwrap_or("unspecified"),
            "Vocabulary store built"
        );

        Self {
            token_to_id,
            id_to_token,
            added,
            merges,
            merge_count,
            specials,
            boundary_marker,
            model_kind: model.kind,
        }
    }

    /// Looks up a token in the model vocabulary (added tokens excluded).
    pub fn get(&self, token: &str) -> Option<i64> {
        self.token_to_id.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Resolves a piece through the added tokens first, then the vocabulary.
    pub fn resolve(&self, piece: &str) -> Option<i64> {
        self.added
            .get(piece)
            .or_else(|| self.token_to_id.get(piece))
            .copied()
    }

    /// Returns the surface form for an id, if known.
    pub fn token(&self, id: i64) -> Option<&str> {
        self.id_to_token.get(&id).map(String::as_str)
    }

    /// Rank of the `(left, right)` merge; lower merges first.
    pub fn merge_rank(&self, left: &str, right: &str) -> Option<usize> {
        self.merges.get(left)?.get(right).copied()
    }

    pub fn specials(&self) -> &SpecialTokens {
        &self.specials
    }

    pub fn boundary_marker(&self) -> char {
        self.boundary_marker
    }

    /// Model type declared by the artifact (`BPE`, `Unigram`, ...).
    pub fn model_kind(&self) -> Option<&str> {
        self.model_kind.as_deref()
    }

    pub fn len(&self) -> usize {
        self.token_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_to_id.is_empty()
    }

    pub fn merge_count(&self) -> usize {
        self.merge_count
    }
}
