//! Error types for the Vela core primitives crate.

use thiserror::Error;

/// Errors raised while constructing or converting primitive types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A fixed-size byte buffer had the wrong length.
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// A hex string could not be decoded.
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// A symbolic contract name was empty or otherwise unusable for address
    /// derivation.
    #[error("invalid contract name: {0}")]
    InvalidContractName(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
