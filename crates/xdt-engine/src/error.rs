//! Error types for document parsing and transformation.

use thiserror::Error;

/// Errors raised while loading, saving, or transforming XML documents.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    // === Parsing ===
    /// The reader rejected the input.
    #[error("XML syntax error at byte {position}: {source}")]
    Syntax {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    /// The input tokenized but is not a well-formed document.
    #[error("ill-formed XML at byte {position}: {reason}")]
    IllFormed { position: usize, reason: String },

    /// An element or attribute uses a prefix with no in-scope declaration.
    #[error("namespace prefix '{prefix}' is not declared (byte {position})")]
    UnboundPrefix { prefix: String, position: usize },

    /// Element names, attribute names and text must be UTF-8.
    #[error("invalid UTF-8 at byte {position}")]
    Utf8 { position: usize },

    // === Transformation ===
    /// The `Transform` attribute names a directive the engine does not know.
    #[error("unknown transform '{name}'")]
    UnknownTransform { name: String },

    /// The `Locator` attribute names a locator the engine does not know.
    #[error("unknown locator '{name}'")]
    UnknownLocator { name: String },

    /// A directive or locator requires arguments that were not supplied.
    #[error("'{directive}' requires at least one argument")]
    MissingArgument { directive: String },

    /// A `Match` locator names an attribute missing on the transform element.
    #[error("no attribute '{attribute}' exists on <{element}> for the Match locator")]
    MissingLocatorAttribute { attribute: String, element: String },

    /// The transform root does not describe the source root.
    #[error("transform root <{transform}> does not match source root <{source_root}>")]
    RootMismatch {
        transform: String,
        source_root: String,
    },

    // === Wrapped ===
    /// Writing events failed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_prefix_display() {
        let err = EngineError::UnboundPrefix {
            prefix: "badns".to_string(),
            position: 14,
        };
        assert_eq!(
            err.to_string(),
            "namespace prefix 'badns' is not declared (byte 14)"
        );
    }

    #[test]
    fn test_root_mismatch_display() {
        let err = EngineError::RootMismatch {
            transform: "settings".to_string(),
            source_root: "configuration".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "transform root <settings> does not match source root <configuration>"
        );
    }
}
