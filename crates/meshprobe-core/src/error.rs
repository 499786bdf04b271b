use thiserror::Error;

/// Top-level error type shared by the meshprobe crates.
#[derive(Error, Debug)]
pub enum MeshprobeError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid node id: {0}")]
    InvalidNodeId(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MeshprobeError>;
