//! Error types for the mapping and serialization stages.

use std::io;

use thiserror::Error;

use cadraw_mapping::ConfigurationError;

/// The main error type for cadraw operations.
#[derive(Debug, Error)]
pub enum CadrawError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A reference predicate still pointed at an unseen object in the
    /// retry pass, where no further records can populate the cache.
    #[error("unresolved reference in record {oid}")]
    UnresolvedReference { oid: String },

    /// A sink write failed while serializing outputs of one input source.
    #[error("failed to write drawing output for {path}")]
    Serialization {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid input {path}: {message}")]
    InvalidInput { path: String, message: String },
}
