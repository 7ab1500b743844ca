// Central Error Type for the Backend Engine

use thiserror::Error;

use crate::application::query::QueryResource;
use crate::port::SpawnFailure;

/// Errors surfaced by the Backend contract
///
/// Transient busy failures and the base-product deregistration conflict are
/// recovered inside the backends and never appear here.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Query attempt budget exhausted while the package database stayed busy
    #[error("unable to get {resource}: gave up after {attempts} attempts")]
    QueryExhausted {
        resource: QueryResource,
        attempts: u32,
    },

    /// Malformed query output; fatal, never retried
    #[error("malformed {resource} output")]
    Parse {
        resource: QueryResource,
        #[source]
        source: serde_json::Error,
    },

    /// Query subprocess failed with an unrecognized status
    #[error("{resource} query failed")]
    Query {
        resource: QueryResource,
        #[source]
        source: SpawnFailure,
    },

    /// Register/deregister subprocess failure with no recoverable signal
    #[error("subscription manager invocation failed")]
    Command(#[from] SpawnFailure),
}

/// Result type alias using BackendError
pub type Result<T> = std::result::Result<T, BackendError>;
