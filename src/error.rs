use std::path::PathBuf;
use thiserror::Error;

use crate::format::FormatError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid schema: {0}")]
    Schema(String),

    #[error("Type mismatch at '{path}': expected {expected}, got {received}")]
    TypeMismatch {
        path: String,
        expected: String,
        received: String,
    },

    #[error("Unknown field '{key}' at '{path}'")]
    UnknownField { path: String, key: String },

    #[error("Missing required field '{0}'")]
    MissingRequiredField(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Failed to parse {path}: {source}")]
    FileFormat {
        path: PathBuf,
        source: FormatError,
    },

    #[error("Failed to render configuration: {0}")]
    Render(#[source] FormatError),

    #[error("Unsupported config file extension for {path} (expected .json, .yaml, .yml or .toml)")]
    UnsupportedFormat { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to extract typed configuration: {0}")]
    Extract(String),

    #[cfg(feature = "clap")]
    #[error(transparent)]
    Cli(#[from] clap::Error),
}

impl ConfigError {
    /// The dotted field path the error refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            ConfigError::TypeMismatch { path, .. }
            | ConfigError::UnknownField { path, .. }
            | ConfigError::MissingRequiredField(path)
            | ConfigError::KeyNotFound(path) => Some(path),
            _ => None,
        }
    }
}
