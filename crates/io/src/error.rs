//! Errors for the canonical binary codec.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IoError {
    #[error("unexpected end of buffer: needed {needed} bytes, {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    #[error("value exceeds maximum length: {length} > {max}")]
    TooLong { length: usize, max: usize },

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error(transparent)]
    Core(#[from] vela_core::CoreError),
}

pub type IoResult<T> = Result<T, IoError>;
