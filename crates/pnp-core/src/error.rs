//! Configuration-level error type.
//!
//! Sub-crates define their own error enums and convert `PnpError` into them
//! via `From`, so a bad parameter file surfaces unchanged at `Sim` build time.

use thiserror::Error;

/// The base error type for `pnp-core` and every configuration path.
#[derive(Debug, Error)]
pub enum PnpError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown scheduling policy {0:?}")]
    UnknownPolicy(String),

    #[error("scheduling policy {0:?} is declared but not implemented")]
    PolicyNotImplemented(String),

    #[error("unknown row pattern {0:?}")]
    UnknownPattern(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PnpError {
    fn from(e: serde_json::Error) -> Self {
        PnpError::Parse(e.to_string())
    }
}

/// Shorthand result type for all `pnp-*` configuration paths.
pub type PnpResult<T> = Result<T, PnpError>;
