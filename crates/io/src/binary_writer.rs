//! Binary writer for the canonical, deterministic encoding described in
//! spec.md §6: little-endian fixed-width integers, the 0xFD/0xFE/0xFF
//! var-length-integer prefix convention, var-length byte arrays, literal
//! 33-byte addresses, and sign-byte-prefixed BigInt magnitudes.

use num_bigint::{BigInt, Sign};
use vela_core::{Address, Hash256, Timestamp};

/// Accumulates bytes for the canonical encoding.
#[derive(Default)]
pub struct BinaryWriter {
    buffer: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(if value { 1 } else { 0 });
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a var-length integer: literal byte if `< 0xFD`, else a prefix
    /// byte (`0xFD`/`0xFE`/`0xFF`) followed by a little-endian u16/u32/u64.
    pub fn write_var_int(&mut self, value: u64) {
        if value < 0xfd {
            self.write_u8(value as u8);
        } else if value <= 0xffff {
            self.write_u8(0xfd);
            self.write_u16(value as u16);
        } else if value <= 0xffff_ffff {
            self.write_u8(0xfe);
            self.write_u32(value as u32);
        } else {
            self.write_u8(0xff);
            self.write_u64(value);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes a var-length-prefixed byte array.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_var_int(bytes.len() as u64);
        self.write_bytes(bytes);
    }

    /// Writes a var-length-prefixed UTF-8 string.
    pub fn write_string(&mut self, s: &str) {
        self.write_var_bytes(s.as_bytes());
    }

    /// Writes the literal 33 bytes of an address.
    pub fn write_address(&mut self, address: &Address) {
        self.write_bytes(address.as_bytes());
    }

    /// Writes the literal 32 bytes of a hash.
    pub fn write_hash(&mut self, hash: &Hash256) {
        self.write_bytes(hash.as_bytes());
    }

    pub fn write_timestamp(&mut self, ts: Timestamp) {
        self.write_u64(ts.secs());
    }

    /// Writes a BigInt as a sign byte (`0` non-negative, `1` negative)
    /// followed by the var-length-prefixed big-endian magnitude.
    pub fn write_bigint(&mut self, value: &BigInt) {
        let sign_byte = match value.sign() {
            Sign::Minus => 1u8,
            _ => 0u8,
        };
        self.write_u8(sign_byte);
        let (_, magnitude) = value.to_bytes_be();
        self.write_var_bytes(&magnitude);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_int_boundaries() {
        let mut w = BinaryWriter::new();
        w.write_var_int(0xfc);
        w.write_var_int(0xfd);
        w.write_var_int(0x1_0000);
        w.write_var_int(0x1_0000_0000);
        let bytes = w.into_bytes();
        assert_eq!(bytes[0], 0xfc);
        assert_eq!(bytes[1], 0xfd);
        assert_eq!(bytes[2..4], 0xfdu16.to_le_bytes());
    }

    #[test]
    fn bigint_negative_round_trips_sign() {
        let mut w = BinaryWriter::new();
        w.write_bigint(&BigInt::from(-42));
        let bytes = w.into_bytes();
        assert_eq!(bytes[0], 1);
    }
}
