//! Binary reader, the inverse of [`crate::binary_writer::BinaryWriter`].

use crate::error::{IoError, IoResult};
use num_bigint::{BigInt, Sign};
use vela_core::{Address, Hash256, Timestamp};

pub struct BinaryReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    fn take(&mut self, len: usize) -> IoResult<&'a [u8]> {
        if self.position + len > self.buffer.len() {
            return Err(IoError::UnexpectedEof {
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.buffer[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> IoResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> IoResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> IoResult<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> IoResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> IoResult<u64> {
        let bytes = self.take(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_i64(&mut self) -> IoResult<i64> {
        let bytes = self.take(8)?;
        Ok(i64::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a var-length integer using the 0xFD/0xFE/0xFF prefix
    /// convention described in spec.md §6.
    pub fn read_var_int(&mut self) -> IoResult<u64> {
        let prefix = self.read_u8()?;
        match prefix {
            0xfd => Ok(self.read_u16()? as u64),
            0xfe => Ok(self.read_u32()? as u64),
            0xff => self.read_u64(),
            n => Ok(n as u64),
        }
    }

    pub fn read_bytes(&mut self, len: usize) -> IoResult<Vec<u8>> {
        Ok(self.take(len)?.to_vec())
    }

    pub fn read_var_bytes(&mut self, max_len: usize) -> IoResult<Vec<u8>> {
        let len = self.read_var_int()? as usize;
        if len > max_len {
            return Err(IoError::TooLong {
                length: len,
                max: max_len,
            });
        }
        self.read_bytes(len)
    }

    pub fn read_string(&mut self, max_len: usize) -> IoResult<String> {
        let bytes = self.read_var_bytes(max_len)?;
        String::from_utf8(bytes).map_err(|e| IoError::InvalidEncoding(e.to_string()))
    }

    pub fn read_address(&mut self) -> IoResult<Address> {
        let bytes = self.take(vela_core::ADDRESS_SIZE)?;
        Ok(Address::from_slice(bytes)?)
    }

    pub fn read_hash(&mut self) -> IoResult<Hash256> {
        let bytes = self.take(vela_core::HASH_SIZE)?;
        Ok(Hash256::from_slice(bytes)?)
    }

    pub fn read_timestamp(&mut self) -> IoResult<Timestamp> {
        Ok(Timestamp::new(self.read_u64()?))
    }

    /// Reads a BigInt written by [`crate::binary_writer::BinaryWriter::write_bigint`].
    pub fn read_bigint(&mut self, max_len: usize) -> IoResult<BigInt> {
        let sign_byte = self.read_u8()?;
        let magnitude = self.read_var_bytes(max_len)?;
        if magnitude.is_empty() {
            return Ok(BigInt::from(0));
        }
        let sign = if sign_byte == 1 {
            Sign::Minus
        } else {
            Sign::Plus
        };
        Ok(BigInt::from_bytes_be(sign, &magnitude))
    }
}
