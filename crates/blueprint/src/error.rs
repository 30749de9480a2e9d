//! Error types for the blueprint crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or building a blueprint
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Blueprint file does not exist
    #[error("blueprint does not exist: {}", .0.display())]
    NotFound(PathBuf),

    /// TOML syntax or shape error
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Declaration-level validation failure
    #[error("invalid blueprint: {0}")]
    Validation(String),

    /// Error surfaced by the topology core while building
    #[error(transparent)]
    Topology(#[from] topology::Error),
}

/// Result type for blueprint operations
pub type Result<T> = std::result::Result<T, Error>;
