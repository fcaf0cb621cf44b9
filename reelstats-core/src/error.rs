//! Error types for reelstats-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the reelstats-core library
///
/// The analytics themselves never fail; these variants cover the edges
/// around them (reading record dumps, configuration, logging setup).
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record source could not be read
    #[error("failed to load records from {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid caller input (bad glob pattern, unusable option)
    #[error("invalid input: {0}")]
    Input(String),
}

/// Result type alias for reelstats-core
pub type Result<T> = std::result::Result<T, Error>;
