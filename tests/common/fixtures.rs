//! Vocabulary fixtures and prebuilt rerankers.
//!
//! The fixture vocabulary covers the words of the two scenario documents.
//! Words it does not know (`weekends.`, `intelligence.`) fall back to
//! character pieces and mostly resolve to `<unk>`.

use std::sync::Arc;

use crossrank::{InferenceSession, Reranker, SessionConfig, Tokenizer};
use tempfile::TempDir;

pub const QUERY: &str = "What is machine learning?";
pub const ML_DOC: &str = "Machine learning is a subset of artificial intelligence.";
pub const PIZZA_DOC: &str = "I like pizza on weekends.";

pub const MAX_LENGTH: usize = 64;

pub const TOKENIZER_JSON: &str = r#"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [
    {"id": 0, "content": "<s>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
    {"id": 1, "content": "<pad>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
    {"id": 2, "content": "</s>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
    {"id": 3, "content": "<unk>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
    {"id": 21, "content": "<mask>", "single_word": false, "lstrip": true, "rstrip": false, "normalized": false, "special": true}
  ],
  "normalizer": null,
  "pre_tokenizer": {
    "type": "Sequence",
    "pretokenizers": [
      {"type": "WhitespaceSplit"},
      {"type": "Metaspace", "replacement": "▁", "prepend_scheme": "always", "split": true}
    ]
  },
  "model": {
    "type": "BPE",
    "unk_id": 3,
    "vocab": [
      ["<s>", 0.0], ["<pad>", 0.0], ["</s>", 0.0], ["<unk>", 0.0],
      ["▁What", -8.1], ["▁is", -5.2], ["▁machine", -9.4], ["▁learning", -9.8],
      ["?", -6.0], ["▁Machine", -10.2], ["▁a", -4.9], ["▁subset", -11.3],
      ["▁of", -4.7], ["▁artificial", -11.0], ["▁intelligence", -10.9],
      ["▁I", -5.5], ["▁like", -7.7], ["▁pizza", -11.6], ["▁on", -5.9],
      ["▁weekends", -11.8], [".", -3.9], ["<mask>", 0.0]
    ],
    "merges": [
      "▁ l", "▁l e", "▁le a", "▁lea r", "▁lear n",
      "▁learn i", "▁learni n", "▁learnin g"
    ]
  }
}"#;

pub fn tokenizer() -> Tokenizer {
    Tokenizer::from_json_str(TOKENIZER_JSON).expect("fixture tokenizer should parse")
}

/// A directory holding only `tokenizer.json`.
pub fn tokenizer_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("tokenizer.json"), TOKENIZER_JSON).expect("write tokenizer");
    dir
}

/// Local reranker over the fixture vocabulary and a stub session.
pub fn stub_reranker() -> Reranker {
    let session = InferenceSession::open(SessionConfig::stub()).expect("stub session");
    Reranker::local(tokenizer(), Arc::new(session), MAX_LENGTH)
}

pub fn scenario_documents() -> Vec<String> {
    vec![PIZZA_DOC.to_string(), ML_DOC.to_string()]
}
