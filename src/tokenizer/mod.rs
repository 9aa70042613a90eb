//! Subword tokenizer for XLM-RoBERTa style cross-encoders.
//!
//! Reproduces the metaspace + pair-merge scheme of a `tokenizer.json`
//! artifact without an external tokenization library:
//!
//! 1. collapse repeated spaces and trim,
//! 2. split on whitespace and prefix each word with the boundary marker,
//! 3. emit known words whole, otherwise merge characters by rank,
//! 4. wrap in `<s> ... </s>`, then truncate or pad to the requested length.
//!
//! Encoding never fails. Malformed or oversized input degrades to
//! well-formed output.

pub mod artifact;
mod bpe;
pub mod error;
pub mod types;
pub mod vocab;


pub use error::ConfigLoadError;
pub use types::EncodedSequence;
pub use vocab::{SpecialTokens, VocabularyStore};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::constants::{PAIR_SEPARATOR, TOKENIZER_FILE};

/// Cheap-to-clone handle over a shared [`VocabularyStore`].
#[derive(Debug, Clone)]
pub struct Tokenizer {
    vocab: Arc<VocabularyStore>,
}

impl Tokenizer {
    /// Loads a tokenizer from a model directory, a model file (uses the
    /// sibling `tokenizer.json`), or an explicit `tokenizer.json` path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let artifact_path = resolve_artifact_path(path.as_ref());
        let vocab = VocabularyStore::from_file(&artifact_path)?;

        info!(
            path = %artifact_path.display(),
            vocab_size = vocab.len(),
            merges = vocab.merge_count(),
            "Tokenizer loaded"
        );

        Ok(Self::from_vocabulary(Arc::new(vocab)))
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigLoadError> {
        Ok(Self::from_vocabulary(Arc::new(
            VocabularyStore::from_json_str(raw)?,
        )))
    }

    pub fn from_vocabulary(vocab: Arc<VocabularyStore>) -> Self {
        Self { vocab }
    }

    pub fn vocabulary(&self) -> &VocabularyStore {
        &self.vocab
    }

    /// Encodes `text` into a sequence of exactly `max_length` positions.
    ///
    /// `max_length == 0` yields three empty vectors.
    pub fn encode(&self, text: &str, max_length: usize) -> EncodedSequence {
        let specials = *self.vocab.specials();
        if max_length == 0 {
            return EncodedSequence::default();
        }

        let mut ids = Vec::with_capacity(max_length.saturating_add(1).min(4096));
        ids.push(specials.begin);

        for word in self.pre_tokenize(&normalize(text)) {
            // with max_length ids already queued the end marker can only land
            // through truncation, so later words cannot change the output
            if ids.len() >= max_length {
                break;
            }
            self.push_word(&word, &mut ids);
        }

        ids.push(specials.end);
        EncodedSequence::assemble(ids, max_length, specials.end, specials.pad)
    }

    /// Encodes a query/passage pair as `query </s> passage`.
    pub fn encode_pair(&self, query: &str, passage: &str, max_length: usize) -> EncodedSequence {
        let mut combined = String::with_capacity(query.len() + PAIR_SEPARATOR.len() + passage.len());
        combined.push_str(query);
        combined.push_str(PAIR_SEPARATOR);
        combined.push_str(passage);
        self.encode(&combined, max_length)
    }

    /// Encodes raw bytes, replacing invalid UTF-8 sequences.
    pub fn encode_bytes(&self, bytes: &[u8], max_length: usize) -> EncodedSequence {
        self.encode(&String::from_utf8_lossy(bytes), max_length)
    }

    /// Encodes `query` against every document, preserving order.
    pub fn encode_pairs<S: AsRef<str>>(
        &self,
        query: &str,
        documents: &[S],
        max_length: usize,
    ) -> Vec<EncodedSequence> {
        documents
            .iter()
            .map(|doc| self.encode_pair(query, doc.as_ref(), max_length))
            .collect()
    }

    /// Subword pieces for `text`, without special tokens or id mapping.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.pre_tokenize(&normalize(text))
            .into_iter()
            .flat_map(|word| {
                if self.vocab.contains(&word) {
                    vec![word]
                } else {
                    bpe::merge_word(&word, &self.vocab)
                }
            })
            .collect()
    }

    fn pre_tokenize(&self, text: &str) -> Vec<String> {
        let marker = self.vocab.boundary_marker();
        text.split_whitespace()
            .map(|word| {
                let mut token = String::with_capacity(word.len() + marker.len_utf8());
                token.push(marker);
                token.push_str(word);
                token
            })
            .collect()
    }

    fn push_word(&self, word: &str, ids: &mut Vec<i64>) {
        if let Some(id) = self.vocab.get(word) {
            ids.push(id);
            return;
        }
        let pieces = bpe::merge_word(word, &self.vocab);
        bpe::resolve_pieces(&pieces, &self.vocab, ids);
    }
}

/// Collapses runs of spaces and trims surrounding whitespace.
pub(crate) fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_space = false;

    for ch in text.chars() {
        let is_space = ch == ' ';
        if is_space && previous_space {
            continue;
        }
        previous_space = is_space;
        out.push(ch);
    }

    out.trim().to_string()
}

fn resolve_artifact_path(path: &Path) -> PathBuf {
    if path
        .file_name()
        .is_some_and(|name| name == std::ffi::OsStr::new(TOKENIZER_FILE))
    {
        path.to_path_buf()
    } else if path.is_dir() {
        path.join(TOKENIZER_FILE)
    } else {
        path.parent()
            .map(|parent| parent.join(TOKENIZER_FILE))
            .unwrap_or_else(|| PathBuf::from(TOKENIZER_FILE))
    }
}
