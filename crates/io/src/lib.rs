//! Canonical, deterministic binary serialization (spec.md §2 item 2 and
//! §6) used to hash and persist every chain value.

pub mod binary_reader;
pub mod binary_writer;
pub mod error;
pub mod serializable;

pub use binary_reader::BinaryReader;
pub use binary_writer::BinaryWriter;
pub use error::{IoError, IoResult};
pub use serializable::Serializable;
