//! The `Serializable` trait: canonical binary encode/decode for every
//! persisted/hashed value (spec.md §6).

use crate::binary_reader::BinaryReader;
use crate::binary_writer::BinaryWriter;
use crate::error::IoResult;
use vela_core::Hash256;

pub trait Serializable: Sized {
    fn encode(&self, writer: &mut BinaryWriter);
    fn decode(reader: &mut BinaryReader) -> IoResult<Self>;

    /// Encodes `self` to a fresh byte buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        self.encode(&mut writer);
        writer.into_bytes()
    }

    /// Decodes a value from a complete byte buffer.
    fn from_bytes(bytes: &[u8]) -> IoResult<Self> {
        let mut reader = BinaryReader::new(bytes);
        Self::decode(&mut reader)
    }

    /// SHA-256 of the canonical encoding — used for block/transaction
    /// identity hashes.
    fn content_hash(&self) -> Hash256 {
        Hash256::sha256(&self.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair(u32, Vec<u8>);

    impl Serializable for Pair {
        fn encode(&self, writer: &mut BinaryWriter) {
            writer.write_u32(self.0);
            writer.write_var_bytes(&self.1);
        }

        fn decode(reader: &mut BinaryReader) -> IoResult<Self> {
            let a = reader.read_u32()?;
            let b = reader.read_var_bytes(4096)?;
            Ok(Pair(a, b))
        }
    }

    #[test]
    fn round_trips_through_bytes() {
        let p = Pair(7, vec![1, 2, 3]);
        let bytes = p.to_bytes();
        let p2 = Pair::from_bytes(&bytes).unwrap();
        assert_eq!(p2.0, 7);
        assert_eq!(p2.1, vec![1, 2, 3]);
    }
}
