//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `CROSSRANK_*` environment
//! variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_MAX_LENGTH, DEFAULT_MODEL_NAME, DEFAULT_THRESHOLD, DEFAULT_TIMEOUT_SECS,
    MAX_TIMEOUT_SECS,
};
use crate::reranker::RemoteMode;

/// Where scores come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    /// Native model in this process.
    #[default]
    Local,
    /// HTTP scoring service.
    Remote,
}

impl StrategyKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "native" => Some(StrategyKind::Local),
            "remote" | "http" => Some(StrategyKind::Remote),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Local => "local",
            StrategyKind::Remote => "remote",
        }
    }
}

/// Reranker configuration loaded from environment variables.
///
/// Use [`RerankerConfig::from_env`] to read `CROSSRANK_*` overrides on top of
/// defaults, then [`RerankerConfig::validate`] before building a reranker.
#[derive(Debug, Clone, PartialEq)]
pub struct RerankerConfig {
    /// Scoring strategy. Default: `local`.
    pub strategy: StrategyKind,

    /// Model directory or `model.safetensors` path (local strategy).
    pub model_path: Option<PathBuf>,

    /// Explicit `tokenizer.json` location. Defaults to the model directory.
    pub tokenizer_path: Option<PathBuf>,

    /// Base URL of the scoring service (remote strategy).
    pub remote_url: Option<String>,

    /// Remote wire mode. Default: `pairs`.
    pub remote_mode: RemoteMode,

    /// Encoded sequence length. Default: `512`.
    pub max_length: usize,

    /// Per-request timeout. Default: 30 seconds.
    pub timeout: Duration,

    /// Default cut-off for threshold filtering. Default: `0.0`.
    pub threshold: f64,

    /// Reported model identifier. Default: `BAAI/bge-reranker-large`.
    pub model_name: String,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            model_path: None,
            tokenizer_path: None,
            remote_url: None,
            remote_mode: RemoteMode::default(),
            max_length: DEFAULT_MAX_LENGTH,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            threshold: DEFAULT_THRESHOLD,
            model_name: DEFAULT_MODEL_NAME.to_string(),
        }
    }
}

impl RerankerConfig {
    pub const ENV_STRATEGY: &'static str = "CROSSRANK_STRATEGY";
    pub const ENV_MODEL_PATH: &'static str = "CROSSRANK_MODEL_PATH";
    pub const ENV_TOKENIZER_PATH: &'static str = "CROSSRANK_TOKENIZER_PATH";
    pub const ENV_REMOTE_URL: &'static str = "CROSSRANK_REMOTE_URL";
    pub const ENV_REMOTE_MODE: &'static str = "CROSSRANK_REMOTE_MODE";
    pub const ENV_MAX_LENGTH: &'static str = "CROSSRANK_MAX_LENGTH";
    pub const ENV_TIMEOUT_SECS: &'static str = "CROSSRANK_TIMEOUT_SECS";
    pub const ENV_THRESHOLD: &'static str = "CROSSRANK_THRESHOLD";
    pub const ENV_MODEL_NAME: &'static str = "CROSSRANK_MODEL_NAME";

    /// Local strategy over a model directory.
    pub fn local<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            strategy: StrategyKind::Local,
            model_path: Some(model_path.into()),
            ..Self::default()
        }
    }

    /// Remote strategy in pair mode.
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            strategy: StrategyKind::Remote,
            remote_url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_remote_mode(mut self, mode: RemoteMode) -> Self {
        self.remote_mode = mode;
        self
    }

    pub fn with_tokenizer_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.tokenizer_path = Some(path.into());
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let strategy = match Self::parse_string_from_env(Self::ENV_STRATEGY) {
            Some(value) => {
                StrategyKind::parse(&value).ok_or(ConfigError::InvalidChoice {
                    name: Self::ENV_STRATEGY,
                    value,
                    expected: "local or remote",
                })?
            }
            None => defaults.strategy,
        };

        let remote_mode = match Self::parse_string_from_env(Self::ENV_REMOTE_MODE) {
            Some(value) => RemoteMode::parse(&value).ok_or(ConfigError::InvalidChoice {
                name: Self::ENV_REMOTE_MODE,
                value,
                expected: "pairs or tensors",
            })?,
            None => defaults.remote_mode,
        };

        let max_length = Self::parse_u64_from_env(Self::ENV_MAX_LENGTH)?
            .map(|v| v as usize)
            .unwrap_or(defaults.max_length);
        let timeout = Self::parse_u64_from_env(Self::ENV_TIMEOUT_SECS)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let threshold = Self::parse_f64_from_env(Self::ENV_THRESHOLD)?.unwrap_or(defaults.threshold);

        Ok(Self {
            strategy,
            model_path: Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH),
            tokenizer_path: Self::parse_optional_path_from_env(Self::ENV_TOKENIZER_PATH),
            remote_url: Self::parse_string_from_env(Self::ENV_REMOTE_URL),
            remote_mode,
            max_length,
            timeout,
            threshold,
            model_name: Self::parse_string_from_env(Self::ENV_MODEL_NAME)
                .unwrap_or(defaults.model_name),
        })
    }

    /// Checks the settings the selected strategy needs (does not load anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_length == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_MAX_LENGTH,
                reason: "must be at least 1".to_string(),
            });
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_TIMEOUT_SECS,
                reason: "must be at least 1 second".to_string(),
            });
        }

        if self.timeout > Duration::from_secs(MAX_TIMEOUT_SECS) {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_TIMEOUT_SECS,
                reason: format!(
                    "must be at most {MAX_TIMEOUT_SECS} seconds, got {}",
                    self.timeout.as_secs()
                ),
            });
        }

        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_THRESHOLD,
                reason: format!("must be between 0.0 and 1.0, got {}", self.threshold),
            });
        }

        if let Some(ref path) = self.tokenizer_path
            && !path.exists()
        {
            return Err(ConfigError::PathNotFound { path: path.clone() });
        }

        match self.strategy {
            StrategyKind::Local => {
                let path = self.model_path.as_ref().ok_or(ConfigError::MissingEnvVar {
                    name: Self::ENV_MODEL_PATH,
                })?;
                if !path.exists() {
                    return Err(ConfigError::PathNotFound { path: path.clone() });
                }
            }
            StrategyKind::Remote => {
                let url = self.remote_url.as_ref().ok_or(ConfigError::MissingEnvVar {
                    name: Self::ENV_REMOTE_URL,
                })?;
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::InvalidUrl { value: url.clone() });
                }
                if self.remote_mode == RemoteMode::Tensors && self.tokenizer_source().is_none() {
                    return Err(ConfigError::MissingEnvVar {
                        name: Self::ENV_TOKENIZER_PATH,
                    });
                }
            }
        }

        Ok(())
    }

    /// Where the tokenizer artifact is read from: the explicit path, else
    /// the model path.
    pub fn tokenizer_source(&self) -> Option<&PathBuf> {
        self.tokenizer_path.as_ref().or(self.model_path.as_ref())
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_u64_from_env(var_name: &'static str) -> Result<Option<u64>, ConfigError> {
        Self::parse_string_from_env(var_name)
            .map(|value| {
                value.parse().map_err(|e| ConfigError::IntParseError {
                    name: var_name,
                    value,
                    source: e,
                })
            })
            .transpose()
    }

    fn parse_f64_from_env(var_name: &'static str) -> Result<Option<f64>, ConfigError> {
        Self::parse_string_from_env(var_name)
            .map(|value| {
                value.parse().map_err(|e| ConfigError::FloatParseError {
                    name: var_name,
                    value,
                    source: e,
                })
            })
            .transpose()
    }
}
