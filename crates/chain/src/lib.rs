//! Ledger layer: blocks, transactions, per-chain execution, and the
//! cross-chain nexus (spec.md §3 "Chain"/"Nexus"/"Block"/"Transaction",
//! §4.3, §4.5, §6).

mod block;
mod chain;
mod error;
mod nexus;
mod script;
mod transaction;

pub use block::Block;
pub use chain::Chain;
pub use error::{ChainError, ChainResult};
pub use nexus::{Nexus, NexusConfig};
pub use script::{build_call_script, ScriptBuilder};
pub use transaction::{total_fee, Signature, Transaction};
