//! Errors for the bytecode VM.

use thiserror::Error;

/// A checked failure during script execution. Every variant here is a
/// `Fault` per spec.md §4.1 — it is terminal and discards the
/// transaction's storage changes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("invalid opcode: {0:#04x}")]
    InvalidOpCode(u8),

    #[error("script truncated while decoding instruction at {position}")]
    TruncatedScript { position: usize },

    #[error("stack underflow: needed {needed}, had {available}")]
    StackUnderflow { needed: usize, available: usize },

    #[error("register index {0} out of range (0..32)")]
    InvalidRegister(u8),

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: &'static str, actual: &'static str },

    #[error("out-of-range jump target {target} (script length {len})")]
    InvalidJumpTarget { target: i64, len: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("payload too long: {length} > {max}")]
    PayloadTooLong { length: usize, max: usize },

    #[error("call stack underflow: no frame to return to")]
    CallStackUnderflow,

    #[error("call stack depth exceeded")]
    CallStackOverflow,

    #[error("out of gas: used {used}, limit {limit}")]
    OutOfGas { used: u64, limit: u64 },

    #[error("unknown interop method: {0}")]
    UnknownInterop(String),

    #[error("unresolvable context address")]
    UnresolvableContext,

    #[error("bounds violation: {0}")]
    BoundsViolation(String),

    #[error("script threw: {0}")]
    Thrown(String),
}

pub type VmResult<T> = Result<T, VmError>;
