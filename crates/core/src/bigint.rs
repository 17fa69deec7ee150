//! Arbitrary-precision signed integer used for every value amount in the
//! system (token balances, gas prices, stake amounts). A thin alias over
//! `num_bigint::BigInt` — the canonical binary encoding for it lives in
//! `vela-io`, which depends on this crate.

pub use num_bigint::BigInt as Int;
pub use num_traits::{Signed, ToPrimitive, Zero};
