//! Serialization errors

use std::path::PathBuf;
use thiserror::Error;

/// Failures while encoding or decoding tagged records
#[derive(Debug, Error)]
pub enum SerializationError {
    /// The document is not valid JSON
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    /// The discriminator names no registered type
    #[error("unknown type discriminator \"{0}\"")]
    UnknownType(String),

    /// A structured node has no discriminator
    #[error("node has no \"type\" discriminator")]
    MissingType,

    /// A registered type appeared where another was required
    #[error("expected a {expected} node, found {found}")]
    UnexpectedType {
        /// Required type name
        expected: &'static str,
        /// Type name in the document
        found: String,
    },

    /// A field is missing or has the wrong shape
    #[error("invalid {owner}.{field}: {message}")]
    Field {
        /// Type owning the field
        owner: &'static str,
        /// Field name
        field: &'static str,
        /// What was wrong
        message: String,
    },

    /// Reading or writing a results file failed
    #[error("could not access {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}
