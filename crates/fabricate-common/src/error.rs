//! Error types shared by the Fabricate crates.

use thiserror::Error;

/// Errors raised while constructing an id reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// The id was empty or whitespace.
    #[error("{kind} reference id must not be blank")]
    BlankId {
        /// Kind of entity being referenced
        kind: &'static str,
    },
}

/// Errors raised while parsing a model version string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    /// The string does not name a known version.
    #[error("Unknown settings model version: {0}")]
    Unknown(String),
}

/// Result type alias for reference construction.
pub type ReferenceResult<T> = Result<T, ReferenceError>;
