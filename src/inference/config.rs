use std::path::{Path, PathBuf};

use crate::constants::{MODEL_CONFIG_FILE, MODEL_WEIGHTS_FILE};

use super::error::SessionError;

/// Which compute device the session may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// First available accelerator compiled in, otherwise CPU.
    #[default]
    Auto,
    Cpu,
}

/// Configuration for [`InferenceSession`](super::InferenceSession).
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Model directory (`config.json` + `model.safetensors`) or weights file.
    pub model_path: Option<PathBuf>,
    pub device: DevicePreference,
    /// If true, score with a deterministic stand-in (no model files required).
    pub testing_stub: bool,
}

impl SessionConfig {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: Some(model_path.into()),
            ..Default::default()
        }
    }

    /// Creates a stub config (no model files; deterministic scores).
    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    pub fn with_device(mut self, device: DevicePreference) -> Self {
        self.device = device;
        self
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.testing_stub {
            return Ok(());
        }

        match self.model_path {
            None => Err(SessionError::InvalidConfig {
                reason: "model_path is required (stubbing is disabled)".to_string(),
            }),
            Some(ref path) if path.as_os_str().is_empty() => Err(SessionError::InvalidConfig {
                reason: "model_path cannot be empty".to_string(),
            }),
            Some(ref path) if !path.exists() => {
                Err(SessionError::ModelNotFound { path: path.clone() })
            }
            Some(_) => Ok(()),
        }
    }

    /// Resolves `(config.json, model.safetensors)` for the configured path.
    pub(crate) fn model_files(&self) -> Result<(PathBuf, PathBuf), SessionError> {
        let path = self
            .model_path
            .as_deref()
            .ok_or_else(|| SessionError::InvalidConfig {
                reason: "model_path is required".to_string(),
            })?;

        let (dir, weights) = if path.is_dir() {
            (path.to_path_buf(), path.join(MODEL_WEIGHTS_FILE))
        } else {
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (dir, path.to_path_buf())
        };

        let config = dir.join(MODEL_CONFIG_FILE);
        for required in [&config, &weights] {
            if !required.exists() {
                return Err(SessionError::ModelLoadFailed {
                    reason: format!("missing {} for {}", required.display(), path.display()),
                });
            }
        }

        Ok((config, weights))
    }
}
