use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;
use crate::diagnostics::Diagnostics;
use crate::value::CodecError;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Invalid provider configuration: {0}")]
    Provider(Diagnostics),

    #[error("Invalid declaration: {0}")]
    Declaration(Diagnostics),
}

impl ConfigError {
    /// The diagnostics carried by a validation failure, if any.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            ConfigError::Provider(d) | ConfigError::Declaration(d) => Some(d),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
