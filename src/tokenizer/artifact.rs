//! Serde schema for the `tokenizer.json` artifact.
//!
//! Only the sections the tokenizer consumes are modelled. Every field is
//! optional so that sparse documents deserialize into empty tables.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// `null` reads as the field's default, like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenizerArtifact {
    pub version: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub added_tokens: Vec<AddedToken>,
    pub pre_tokenizer: Option<PreTokenizerSpec>,
    pub model: Option<ModelSpec>,
}

/// Special/added token with an explicit id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddedToken {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(deserialize_with = "null_as_default")]
    pub single_word: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub lstrip: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub rstrip: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub normalized: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub special: bool,
}

/// Pre-tokenizer metadata. `Sequence` pre-tokenizers nest their members.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreTokenizerSpec {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub replacement: Option<String>,
    pub prepend_scheme: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub pretokenizers: Vec<PreTokenizerSpec>,
}

impl PreTokenizerSpec {
    /// First boundary glyph declared by this pre-tokenizer or any nested one.
    pub fn boundary_marker(&self) -> Option<char> {
        self.replacement
            .as_deref()
            .and_then(|r| r.chars().next())
            .or_else(|| {
                self.pretokenizers
                    .iter()
                    .find_map(PreTokenizerSpec::boundary_marker)
            })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelSpec {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub unk_id: Option<i64>,
    pub vocab: Option<VocabSpec>,
    #[serde(deserialize_with = "null_as_default")]
    pub merges: Vec<MergeSpec>,
}

/// Vocabulary in either of the two layouts found in the wild.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VocabSpec {
    /// `[[token, weight], ...]`; the id is the position in the list.
    Scored(Vec<(String, f64)>),
    /// `{ token: id }`.
    Indexed(HashMap<String, i64>),
}

/// Merge rule, either `"left right"` or `["left", "right"]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MergeSpec {
    Joined(String),
    Pair(String, String),
}

impl MergeSpec {
    /// Splits the rule into its two halves; malformed rules yield `None`.
    pub fn halves(&self) -> Option<(&str, &str)> {
        match self {
            MergeSpec::Joined(rule) => {
                let (left, right) = rule.split_once(' ')?;
                if left.is_empty() || right.is_empty() || right.contains(' ') {
                    return None;
                }
                Some((left, right))
            }
            MergeSpec::Pair(left, right) => Some((left.as_str(), right.as_str())),
        }
    }
}
