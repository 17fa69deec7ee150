//! Vela: a deterministic multi-chain transaction execution core —
//! bytecode VM, transaction runtime, native contracts, and ledger,
//! re-exported as one crate for embedders that want the whole stack
//! without naming every `vela-*` crate individually.

pub use vela_chain as chain;
pub use vela_contracts as contracts;
pub use vela_core as core;
pub use vela_io as io;
pub use vela_runtime as runtime;
pub use vela_storage as storage;
pub use vela_vm as vm;

pub use vela_chain::{Block, Chain, ChainError, ChainResult, Nexus, NexusConfig, Signature, Transaction};
