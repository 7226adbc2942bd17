//! Error types for patch generation

use thiserror::Error;

/// Result type for patch generation
pub type Result<T, E = PatchError> = std::result::Result<T, E>;

/// Errors raised while building a patch
#[derive(Debug, Error)]
pub enum PatchError {
    /// A generated path was not a valid JSON Pointer
    #[error("invalid JSON pointer {path}: {message}")]
    InvalidPointer {
        /// The rejected path
        path: String,
        /// Parser diagnostic
        message: String,
    },

    /// A desired topology spread constraint has no topologyKey
    #[error("topology spread constraint at position {index} has no topologyKey")]
    MissingTopologyKey {
        /// Position of the offending constraint in the configured list
        index: usize,
    },
}
