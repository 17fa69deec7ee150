//! Errors raised by the runtime's own entry points (executing a script to
//! completion). Faults raised *during* execution travel as [`vela_vm::VmError`]
//! through the `InteropHost` seam instead, since that is the channel the
//! engine already understands.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("contract {0} is not registered")]
    UnknownContract(String),

    #[error(transparent)]
    Storage(#[from] vela_storage::StorageError),

    #[error(transparent)]
    Core(#[from] vela_core::CoreError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
