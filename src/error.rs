use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("particle lifetime must be finite and positive, got {0}")]
    InvalidLifetime(f32),

    #[error("{field} must be finite")]
    NonFinite { field: &'static str },

    #[error("particle size must be finite and non-negative, got {0}")]
    InvalidSize(f32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse config file {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
