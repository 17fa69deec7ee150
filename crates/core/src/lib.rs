//! Primitive types shared by every layer of the Vela chain core: addresses,
//! hashes, timestamps, arbitrary-precision integers, and the `Clock`/
//! `Crypto` collaborator hooks named in spec §6.

pub mod address;
pub mod bigint;
pub mod clock;
pub mod crypto;
pub mod error;
pub mod hash;
pub mod timestamp;

pub use address::{Address, ADDRESS_SIZE};
pub use bigint::Int;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use hash::{Hash256, HASH_SIZE};
pub use timestamp::Timestamp;
