use crate::analyzer::kubescore::{FormatError, ParseError, RegistryError, ScoreError, VersionError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KubeScoreError {
    #[error("Manifest parsing failed: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Version(#[from] VersionError),

    #[error("Check registry is invalid: {0}")]
    Registry(#[from] RegistryError),

    #[error("Scoring failed: {0}")]
    Score(#[from] ScoreError),

    #[error("{0}")]
    Format(#[from] FormatError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No files given as arguments")]
    NoFiles,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, KubeScoreError>;
