//! Error types for YAML → JSON-lines conversion.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a conversion run. Every variant is fatal.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// A source could not be opened for reading (missing file, permissions).
    #[error("file loading error: {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A document in the stream is not valid YAML, or cannot be represented
    /// as a `Value`. `line` is 1-based when the YAML parser reported a position.
    #[error("{source_name}: YAML decoding error: {message}")]
    Decode {
        source_name: String,
        line: Option<usize>,
        message: String,
    },

    /// A decoded value could not be serialized as JSON (e.g. `.inf`).
    #[error("{source_name}: JSON encoding error: {source}")]
    Encode {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Writing to the output sink failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl ConvertError {
    /// The 1-based input line of a decode failure, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            ConvertError::Decode { line, .. } => *line,
            _ => None,
        }
    }
}

/// Convenience alias used throughout yaml2json-core.
pub type Result<T> = std::result::Result<T, ConvertError>;
