//! Native scoring session.
//!
//! [`InferenceSession`] owns one loaded cross-encoder and turns
//! [`EncodedSequence`]s into probabilities. The model sits behind a
//! read/write lock: scoring takes the read side so callers run in parallel,
//! while [`initialize`](InferenceSession::initialize) and
//! [`close`](InferenceSession::close) take the write side and wait for
//! in-flight scoring to drain.
//!
//! Lifecycle: `Uninitialized -> Ready -> Closed`. A closed session can be
//! initialized again; scoring outside `Ready` fails with
//! [`SessionError::NotInitialized`].

pub mod config;
pub mod device;
pub mod error;
mod model;

#[cfg(test)]
mod tests;

pub use config::{DevicePreference, SessionConfig};
pub use error::{InferenceError, SessionError};

use std::collections::HashMap;

use candle_core::{DType, Device, Tensor};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::context::RerankContext;
use crate::tokenizer::EncodedSequence;

use device::{device_label, select_device};
use model::CrossEncoderModel;

/// Logistic function, clamped to the open interval `(0, 1)`.
pub fn sigmoid(x: f64) -> f64 {
    (1.0 / (1.0 + (-x).exp())).clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON)
}

enum SessionBackend {
    Model {
        model: CrossEncoderModel,
        device: Device,
    },
    Stub,
}

impl SessionBackend {
    fn logit(&self, sequence: &EncodedSequence) -> candle_core::Result<f64> {
        match self {
            SessionBackend::Model { model, device } => {
                let input_ids = to_u32(&sequence.input_ids)?;
                let attention_mask = to_u32(&sequence.attention_mask)?;

                let input_ids = Tensor::new(input_ids.as_slice(), device)?.unsqueeze(0)?;
                let attention_mask = Tensor::new(attention_mask.as_slice(), device)?.unsqueeze(0)?;

                let logits = model.forward(&input_ids, &attention_mask)?;
                let values = logits.flatten_all()?.to_dtype(DType::F32)?.to_vec1::<f32>()?;

                values
                    .first()
                    .copied()
                    .map(f64::from)
                    .ok_or_else(|| candle_core::Error::Msg("model produced no logits".to_string()))
            }
            SessionBackend::Stub => Ok(stub_logit(sequence)),
        }
    }

    fn label(&self) -> String {
        match self {
            SessionBackend::Model { model, device } => {
                format!("{}@{}", model.architecture(), device_label(device))
            }
            SessionBackend::Stub => "stub".to_string(),
        }
    }
}

enum SessionState {
    Uninitialized,
    Ready(SessionBackend),
    Closed,
}

/// Owned native scoring model with an explicit init/close lifecycle.
pub struct InferenceSession {
    config: SessionConfig,
    state: RwLock<SessionState>,
}

impl std::fmt::Debug for InferenceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.state.read() {
            SessionState::Uninitialized => "uninitialized".to_string(),
            SessionState::Ready(backend) => format!("ready({})", backend.label()),
            SessionState::Closed => "closed".to_string(),
        };
        f.debug_struct("InferenceSession")
            .field("config", &self.config)
            .field("state", &state)
            .finish()
    }
}

impl InferenceSession {
    /// Creates an uninitialized session; nothing is loaded yet.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: RwLock::new(SessionState::Uninitialized),
        }
    }

    /// Creates and initializes a session in one step.
    pub fn open(config: SessionConfig) -> Result<Self, SessionError> {
        let session = Self::new(config);
        session.initialize()?;
        Ok(session)
    }

    /// Loads the model. Calling this on a ready session is a no-op.
    pub fn initialize(&self) -> Result<(), SessionError> {
        let mut state = self.state.write();
        if matches!(*state, SessionState::Ready(_)) {
            debug!("Inference session already initialized");
            return Ok(());
        }

        self.config.validate()?;
        let backend = self.load_backend()?;

        info!(backend = %backend.label(), "Inference session ready");
        *state = SessionState::Ready(backend);
        Ok(())
    }

    fn load_backend(&self) -> Result<SessionBackend, SessionError> {
        if self.config.testing_stub {
            warn!("Inference session running in STUB mode (testing only)");
            return Ok(SessionBackend::Stub);
        }

        let (config_path, weights_path) = self.config.model_files()?;
        let device = select_device(self.config.device)?;

        info!(
            config = %config_path.display(),
            weights = %weights_path.display(),
            device = device_label(&device),
            "Loading scoring model"
        );

        let model = CrossEncoderModel::load(&config_path, &weights_path, &device).map_err(|e| {
            SessionError::ModelLoadFailed {
                reason: format!("failed to load {}: {e}", weights_path.display()),
            }
        })?;

        Ok(SessionBackend::Model { model, device })
    }

    /// Releases the model. Safe to call repeatedly.
    pub fn close(&self) -> Result<(), SessionError> {
        let mut state = self.state.write();
        match std::mem::replace(&mut *state, SessionState::Closed) {
            SessionState::Ready(backend) => {
                info!(backend = %backend.label(), "Inference session closed");
                drop(backend);
            }
            SessionState::Uninitialized => *state = SessionState::Uninitialized,
            SessionState::Closed => debug!("Inference session already closed"),
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        matches!(*self.state.read(), SessionState::Ready(_))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Scores every sequence; see [`Self::run_inference_with_context`].
    pub fn run_inference(&self, batch: &[EncodedSequence]) -> Result<Vec<f64>, InferenceError> {
        self.run_inference_with_context(batch, &RerankContext::background())
    }

    /// Scores every sequence in order, returning `sigmoid(logit)` per item.
    ///
    /// `ctx` is checked before each item; an item already running is not
    /// interrupted. An empty batch returns without touching the model.
    pub fn run_inference_with_context(
        &self,
        batch: &[EncodedSequence],
        ctx: &RerankContext,
    ) -> Result<Vec<f64>, InferenceError> {
        let state = self.state.read();
        let SessionState::Ready(backend) = &*state else {
            return Err(SessionError::NotInitialized.into());
        };

        if batch.is_empty() {
            return Ok(Vec::new());
        }

        debug!(batch_size = batch.len(), "Running inference");

        let mut scores = Vec::with_capacity(batch.len());
        for (index, sequence) in batch.iter().enumerate() {
            ctx.check()?;
            validate_sequence(index, sequence)?;

            let logit = backend
                .logit(sequence)
                .map_err(|e| InferenceError::Failed {
                    index,
                    reason: e.to_string(),
                })?;
            scores.push(sigmoid(logit));
        }

        Ok(scores)
    }
}

fn validate_sequence(index: usize, sequence: &EncodedSequence) -> Result<(), InferenceError> {
    if sequence.input_ids.is_empty() {
        return Err(InferenceError::InvalidInput {
            index,
            reason: "empty sequence".to_string(),
        });
    }
    if sequence.input_ids.len() != sequence.attention_mask.len() {
        return Err(InferenceError::InvalidInput {
            index,
            reason: format!(
                "input_ids has {} positions but attention_mask has {}",
                sequence.input_ids.len(),
                sequence.attention_mask.len()
            ),
        });
    }
    Ok(())
}

fn to_u32(values: &[i64]) -> candle_core::Result<Vec<u32>> {
    values
        .iter()
        .map(|&v| {
            u32::try_from(v)
                .map_err(|_| candle_core::Error::Msg(format!("token id {v} out of range")))
        })
        .collect()
}

/// Deterministic stand-in logit for stub sessions.
///
/// Uses the share of distinct ids that occur more than once inside the
/// real-token span (begin and end markers excluded). A passage repeating
/// query tokens scores higher than one sharing none.
fn stub_logit(sequence: &EncodedSequence) -> f64 {
    let real = sequence.real_len();
    if real <= 2 {
        return -4.0;
    }

    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &id in &sequence.input_ids[1..real - 1] {
        *counts.entry(id).or_default() += 1;
    }

    let repeated = counts.values().filter(|&&n| n > 1).count();
    let ratio = repeated as f64 / counts.len() as f64;

    8.0 * ratio - 2.0
}
