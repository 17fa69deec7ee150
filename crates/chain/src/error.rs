//! Ledger and cross-chain transfer errors (spec.md §7's error taxonomy).

use thiserror::Error;
use vela_core::Hash256;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("block height {got} does not follow the chain's current height (expected {expected})")]
    BadHeight { expected: u32, got: u32 },

    #[error("block's previous_hash does not match the chain's current tip")]
    BadPreviousHash,

    #[error("transaction {0} is missing a valid witness signature for its payer")]
    MissingWitness(Hash256),

    #[error("transaction {0} is already present in this chain")]
    DuplicateTransaction(Hash256),

    #[error("transaction {hash} faulted: {reason}")]
    TransactionFaulted { hash: Hash256, reason: String },

    #[error("transaction {0} has expired")]
    TransactionExpired(Hash256),

    #[error("unknown chain {0}")]
    UnknownChain(String),

    #[error("unknown token {0}")]
    UnknownToken(String),

    #[error("no escrow record for transaction {0}")]
    EscrowNotFound(Hash256),

    #[error("escrow for transaction {0} names a different destination chain")]
    EscrowDestinationMismatch(Hash256),

    #[error("escrow for transaction {0} has already been settled")]
    EscrowAlreadySettled(Hash256),

    #[error("{dest} is not a descendant of {src}, settlement requires an ancestor/descendant pair")]
    ChainsNotRelated { src: String, dest: String },

    #[error("source chain has not yet finalized the block containing transaction {0}")]
    EscrowNotFinalized(Hash256),

    #[error("nexus already has a genesis chain, cannot bootstrap twice")]
    AlreadyBootstrapped,

    #[error(transparent)]
    Contract(#[from] vela_contracts::ContractError),

    #[error(transparent)]
    Io(#[from] vela_io::IoError),

    #[error(transparent)]
    Core(#[from] vela_core::CoreError),
}

pub type ChainResult<T> = Result<T, ChainError>;
