//! Error types for transform orchestration.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use xdt_engine::EngineError;

/// Errors returned by transformation sources and the transformer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransformError {
    // === Argument Errors ===
    /// A required argument was empty or whitespace.
    #[error("Value cannot be null or whitespace. (Parameter '{parameter}')")]
    InvalidArgument { parameter: &'static str },

    // === File System Errors ===
    /// A file did not exist when it was opened.
    #[error("{source} File: '{path}'")]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // === Transformation Errors ===
    /// The engine reported that the transformation did not apply cleanly.
    #[error("{}", failure_message(.source_file, .transform, .target))]
    TransformFailed {
        source_file: PathBuf,
        transform: Option<PathBuf>,
        target: PathBuf,
    },

    /// A fragment could not be turned into a well-formed document.
    #[error("The fragment could not be converted into a valid XML document.")]
    InvalidDocument,

    // === Wrapped ===
    /// Parse or apply error raised by the engine.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl TransformError {
    /// Wraps an I/O error for `path`, keeping not-found distinct.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        if source.kind() == io::ErrorKind::NotFound {
            TransformError::NotFound { path, source }
        } else {
            TransformError::Io { path, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TransformError::NotFound { .. })
    }

    /// The offending parameter of an `InvalidArgument` error.
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            TransformError::InvalidArgument { parameter } => Some(*parameter),
            _ => None,
        }
    }
}

fn failure_message(source_file: &Path, transform: &Option<PathBuf>, target: &Path) -> String {
    match transform {
        Some(transform) => format!(
            "Failed to transform \"{}\" using \"{}\" to \"{}\"",
            source_file.display(),
            transform.display(),
            target.display()
        ),
        None => format!(
            "Failed to transform \"{}\" to \"{}\"",
            source_file.display(),
            target.display()
        ),
    }
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;
