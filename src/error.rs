//! The crate's two recoverable error families (§7): malformed operations reaching a
//! public entry point, and server-side rejections. Everything below these layers
//! (`primitive`, `slice`, `normalize`) treats its preconditions as already checked and
//! panics via `unreachable!`/`assert!` rather than returning a `Result` — those
//! preconditions are internal contract, not something a caller of the public API can
//! trigger without going through [`OpError`] first.

use thiserror::Error;

/// Returned by [`crate::operation::Operation::compose`]/`transform` when the two
/// operations' lengths don't satisfy the precondition the operator requires.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpError {
    #[error(
        "length mismatch: left side has length {left}, right side expects {right}"
    )]
    LengthMismatch { left: usize, right: usize },
}

/// Returned by [`crate::server::StateStore::apply_client`] (§4.G).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("client referenced revision {requested}, but the log only goes back to {earliest}")]
    UnknownRevision { requested: u64, earliest: u64 },

    #[error("operation's input length {expected} does not match the document length {actual}")]
    InvalidOperation { expected: usize, actual: usize },
}

/// Returned by the wire codec (§6) when decoding a composite operation from JSON.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown operation type {0:?}")]
    UnknownOp(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
