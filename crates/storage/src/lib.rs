//! Storage layer: a key-value context with copy-on-write change sets, and
//! structured `Map`/`List` collections built on top (spec.md §3).

pub mod change_set;
pub mod collections;
pub mod error;

pub use change_set::{ChangeSet, Storage};
pub use collections::{StorageList, StorageMap};
pub use error::{StorageError, StorageResult};
