use std::path::Path;

use candle_core::{DType, Device, IndexOp, Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use candle_transformers::models::xlm_roberta::{
    Config as XlmRobertaConfig, XLMRobertaForSequenceClassification,
};
use serde::Deserialize;

/// Only `model_type` is needed to pick an architecture.
#[derive(Debug, Default, Deserialize)]
struct ArchitectureProbe {
    #[serde(default)]
    model_type: Option<String>,
}

/// BERT encoder with a single-logit head on the `[CLS]` position.
pub(crate) struct BertCrossEncoder {
    bert: BertModel,
    classifier: Linear,
}

impl BertCrossEncoder {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let bert = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("bert"), config)?
        } else if vb.contains_tensor("roberta.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("roberta"), config)?
        } else {
            BertModel::load(vb.clone(), config)?
        };
        let classifier = candle_nn::linear(config.hidden_size, 1, vb.pp("classifier"))?;

        Ok(Self { bert, classifier })
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let hidden = self
            .bert
            .forward(input_ids, token_type_ids, Some(attention_mask))?;
        let cls = hidden.i((.., 0, ..))?;
        self.classifier.forward(&cls)
    }
}

/// Native cross-encoder producing one relevance logit per sequence.
pub(crate) enum CrossEncoderModel {
    Bert(BertCrossEncoder),
    XlmRoberta(XLMRobertaForSequenceClassification),
}

impl CrossEncoderModel {
    /// Loads weights for the architecture named by `config.json`.
    ///
    /// `xlm-roberta` checkpoints (the BGE reranker family) use the XLM-R
    /// classifier; anything else is treated as a BERT-style encoder.
    pub(crate) fn load(config_path: &Path, weights_path: &Path, device: &Device) -> Result<Self> {
        let raw = std::fs::read_to_string(config_path)?;
        let probe: ArchitectureProbe = serde_json::from_str(&raw)
            .map_err(|e| candle_core::Error::Msg(format!("failed to parse model config: {e}")))?;

        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };

        match probe.model_type.as_deref() {
            Some("xlm-roberta") => {
                let config: XlmRobertaConfig = serde_json::from_str(&raw).map_err(|e| {
                    candle_core::Error::Msg(format!("failed to parse xlm-roberta config: {e}"))
                })?;
                Ok(Self::XlmRoberta(XLMRobertaForSequenceClassification::new(
                    1, &config, vb,
                )?))
            }
            _ => {
                let config: BertConfig = serde_json::from_str(&raw).map_err(|e| {
                    candle_core::Error::Msg(format!("failed to parse bert config: {e}"))
                })?;
                Ok(Self::Bert(BertCrossEncoder::load(vb, &config)?))
            }
        }
    }

    /// Runs one forward pass; inputs are `[batch, seq_len]` u32 tensors.
    pub(crate) fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let token_type_ids = input_ids.zeros_like()?;
        match self {
            Self::Bert(model) => model.forward(input_ids, &token_type_ids, attention_mask),
            Self::XlmRoberta(model) => model.forward(input_ids, attention_mask, &token_type_ids),
        }
    }

    pub(crate) fn architecture(&self) -> &'static str {
        match self {
            Self::Bert(_) => "bert",
            Self::XlmRoberta(_) => "xlm-roberta",
        }
    }
}
