//! Error types for the meshprobe-harness crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Config error: {0}")]
    Config(#[from] meshprobe_core::MeshprobeError),

    #[error("meshprobe binary not found at {}", .0.display())]
    BinaryNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
