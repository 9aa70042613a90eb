//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Value is not one of the accepted spellings.
    #[error("invalid value '{value}' for {name}: expected {expected}")]
    InvalidChoice {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Numeric variable could not be parsed as an integer.
    #[error("failed to parse {name}='{value}': {source}")]
    IntParseError {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Numeric variable could not be parsed as a float.
    #[error("failed to parse {name}='{value}': {source}")]
    FloatParseError {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// Value parsed but is outside the accepted range.
    #[error("{name} out of range: {reason}")]
    OutOfRange { name: &'static str, reason: String },

    /// A setting required by the selected strategy was not provided.
    #[error("missing required environment variable: {name}")]
    MissingEnvVar { name: &'static str },

    /// Remote URL is not an absolute http(s) URL.
    #[error("invalid remote URL '{value}': must start with http:// or https://")]
    InvalidUrl { value: String },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },
}
