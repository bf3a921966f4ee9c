//! Error types for naming and placement operations.

use std::io;

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, HashmvError>;

/// Errors that can occur while naming or placing a file.
///
/// None of these conditions are transient, so no caller retries them. The
/// variants are part of the CLI contract via [`HashmvError::exit_code`].
#[derive(Debug, Error)]
pub enum HashmvError {
    /// The requested digest algorithm is not in the provider catalogue.
    #[error("unknown digest algorithm '{name}'")]
    AlgorithmNotFound { name: String },

    /// A template expansion would exceed the destination buffer.
    #[error("destination buffer overflow while expanding template")]
    BufferOverflow,

    /// A slice directive requested more hex characters than the digest holds.
    #[error("directive width {width} exceeds the {digest_len}-byte digest")]
    UnsatisfiableWidth { width: usize, digest_len: usize },

    /// Reading the data source failed mid-pass.
    #[error("reading source failed: {0}")]
    SourceRead(#[source] io::Error),

    /// Writing to the anonymous staging file failed.
    #[error("writing staging file failed: {0}")]
    StagingWrite(#[source] io::Error),

    /// The terminal link/rename call failed; the destination was left as it was.
    #[error("committing destination failed: {0}")]
    Commit(#[source] io::Error),

    /// Any other I/O failure (open, stat, staging allocation).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl HashmvError {
    /// Suggested exit code for the CLI (part of the public contract).
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AlgorithmNotFound { .. } => 2,
            Self::BufferOverflow | Self::UnsatisfiableWidth { .. } => 3,
            Self::SourceRead(_) => 4,
            Self::StagingWrite(_) => 5,
            Self::Commit(_) => 6,
            Self::Io(_) => 1,
        }
    }
}
