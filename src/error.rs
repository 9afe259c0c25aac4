//! Error types for the fallible parts of the library.
//!
//! The classification engines themselves never fail; these errors come from
//! loading rulesets and reading or writing monitor history.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by ruleset sources and history stores
#[derive(Error, Debug)]
pub enum Error {
    /// No ruleset is registered under the requested name
    #[error("Unknown ruleset: {0}")]
    UnknownRuleset(String),

    /// A ruleset document could not be parsed
    #[error("Invalid ruleset: {0}")]
    InvalidRuleset(String),

    /// A ruleset file could not be parsed
    #[error("Invalid ruleset document at {path}: {message}")]
    RulesetParse {
        /// Where the document was read from
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A history file exists but could not be decoded
    #[error("Corrupt history for '{name}': {source}")]
    CorruptHistory {
        /// Ruleset name the history belongs to
        name: String,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },

    /// A history file was written by an incompatible version
    #[error("Unsupported history version {version} for '{name}'")]
    UnsupportedHistoryVersion {
        /// Ruleset name the history belongs to
        name: String,
        /// Version found in the file
        version: u32,
    },

    /// Filesystem error
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Serialisation failure while persisting data
    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Library result alias
pub type Result<T, E = Error> = std::result::Result<T, E>;
