//! Errors raised by native-contract bookkeeping that does not go through
//! the VM's fault channel (e.g. chain-level read APIs).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("token {0} already exists")]
    DuplicateToken(String),

    #[error("unknown token {0}")]
    UnknownToken(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Storage(#[from] vela_storage::StorageError),

    #[error(transparent)]
    Io(#[from] vela_io::IoError),
}

pub type ContractResult<T> = Result<T, ContractError>;
