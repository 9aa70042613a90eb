use serde::{Deserialize, Serialize};

/// Fixed-length encoder input: ids, attention mask and token-type ids.
///
/// All three vectors always share one length: the requested maximum length,
/// or zero when the requested length was zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSequence {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl EncodedSequence {
    /// Truncates or pads assembled ids to `max_length`.
    ///
    /// When truncation happens the last slot is overwritten with `end_id`.
    pub(crate) fn assemble(mut ids: Vec<i64>, max_length: usize, end_id: i64, pad_id: i64) -> Self {
        if max_length == 0 {
            return Self::default();
        }

        if ids.len() > max_length {
            ids.truncate(max_length);
            if let Some(last) = ids.last_mut() {
                *last = end_id;
            }
        }

        let real = ids.len();
        let mut attention_mask = vec![0; max_length];
        attention_mask[..real].fill(1);
        ids.resize(max_length, pad_id);

        Self {
            input_ids: ids,
            attention_mask,
            token_type_ids: vec![0; max_length],
        }
    }

    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Number of non-padding positions.
    pub fn real_len(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}
