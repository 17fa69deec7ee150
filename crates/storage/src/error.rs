//! Errors for the storage layer.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] vela_io::IoError),

    #[error("list index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: u64, len: u64 },
}

pub type StorageResult<T> = Result<T, StorageError>;
