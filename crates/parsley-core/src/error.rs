//! Host-embedding level failures, distinct from Parsley `error` runtime values.
//!
//! A [`CoreError`] signals that the engine itself could not proceed (a poisoned
//! lock, a malformed configuration, a JSON encode failure on the host side). A
//! Parsley program never sees one directly; it only ever sees
//! [`crate::errorvalue::ErrorValue`], which is data, not a Rust error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("environment lock poisoned")]
    LockPoisoned,

    #[error("invalid engine configuration: {0}")]
    Config(String),

    #[error("json encode/decode failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
