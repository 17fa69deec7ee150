//! VMObject: the tagged-union value type the VM operates on (spec.md §9,
//! "Dynamic typing of VM values" — a sum type replacing the source's open
//! object typing).

use crate::error::{VmError, VmResult};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use vela_core::Address;

/// A value the VM's registers, stack, and struct fields hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VMObject {
    Null,
    Bool(bool),
    Int(BigInt),
    String(String),
    Bytes(Vec<u8>),
    Address(Address),
    /// An ordered, unnamed field list (spec.md §3, "struct (ordered field
    /// map)").
    Struct(Vec<VMObject>),
    /// A resolved reference to another contract's context, built by `CTX`
    /// and entered with `SWITCH` (spec.md §4.1).
    Context(Address),
}

impl VMObject {
    pub fn type_name(&self) -> &'static str {
        match self {
            VMObject::Null => "null",
            VMObject::Bool(_) => "bool",
            VMObject::Int(_) => "int",
            VMObject::String(_) => "string",
            VMObject::Bytes(_) => "bytes",
            VMObject::Address(_) => "address",
            VMObject::Struct(_) => "struct",
            VMObject::Context(_) => "context",
        }
    }

    pub fn as_bool(&self) -> VmResult<bool> {
        match self {
            VMObject::Bool(b) => Ok(*b),
            VMObject::Int(i) => Ok(!i.is_zero()),
            VMObject::Null => Ok(false),
            other => Err(VmError::TypeMismatch {
                expected: "bool",
                actual: other.type_name(),
            }),
        }
    }

    pub fn as_int(&self) -> VmResult<BigInt> {
        match self {
            VMObject::Int(i) => Ok(i.clone()),
            VMObject::Bool(b) => Ok(BigInt::from(*b as i64)),
            VMObject::Bytes(b) => {
                if b.len() > 32 {
                    return Err(VmError::BoundsViolation(
                        "bytes-to-integer conversion requires length <= 32".to_string(),
                    ));
                }
                Ok(BigInt::from_signed_bytes_le(b))
            }
            other => Err(VmError::TypeMismatch {
                expected: "int",
                actual: other.type_name(),
            }),
        }
    }

    pub fn as_bytes(&self) -> VmResult<Vec<u8>> {
        match self {
            VMObject::Bytes(b) => Ok(b.clone()),
            VMObject::String(s) => Ok(s.as_bytes().to_vec()),
            VMObject::Address(a) => Ok(a.as_bytes().to_vec()),
            VMObject::Int(i) => Ok(i.to_signed_bytes_le()),
            other => Err(VmError::TypeMismatch {
                expected: "bytes",
                actual: other.type_name(),
            }),
        }
    }

    pub fn as_string(&self) -> VmResult<String> {
        match self {
            VMObject::String(s) => Ok(s.clone()),
            VMObject::Bytes(b) => String::from_utf8(b.clone()).map_err(|_| VmError::TypeMismatch {
                expected: "utf8 string",
                actual: "bytes",
            }),
            other => Err(VmError::TypeMismatch {
                expected: "string",
                actual: other.type_name(),
            }),
        }
    }

    pub fn as_address(&self) -> VmResult<Address> {
        match self {
            VMObject::Address(a) => Ok(*a),
            VMObject::Context(a) => Ok(*a),
            VMObject::Bytes(b) => Address::from_slice(b).map_err(|_| VmError::TypeMismatch {
                expected: "33-byte address",
                actual: "bytes",
            }),
            other => Err(VmError::TypeMismatch {
                expected: "address",
                actual: other.type_name(),
            }),
        }
    }

    pub fn as_struct(&self) -> VmResult<&[VMObject]> {
        match self {
            VMObject::Struct(fields) => Ok(fields),
            other => Err(VmError::TypeMismatch {
                expected: "struct",
                actual: other.type_name(),
            }),
        }
    }

    /// Reads field `index` of a struct value (SPEC_FULL §3 supplement).
    pub fn get_field(&self, index: usize) -> VmResult<VMObject> {
        self.as_struct()?
            .get(index)
            .cloned()
            .ok_or_else(|| VmError::BoundsViolation(format!("struct field {index} out of range")))
    }

    /// Writes field `index` of a struct value in place.
    pub fn set_field(&mut self, index: usize, value: VMObject) -> VmResult<()> {
        match self {
            VMObject::Struct(fields) => {
                let slot = fields
                    .get_mut(index)
                    .ok_or_else(|| VmError::BoundsViolation(format!("struct field {index} out of range")))?;
                *slot = value;
                Ok(())
            }
            other => Err(VmError::TypeMismatch {
                expected: "struct",
                actual: other.type_name(),
            }),
        }
    }

    /// Byte length used by `SIZE` — matches whichever representation is
    /// natural for the value's type.
    pub fn size(&self) -> VmResult<i64> {
        Ok(match self {
            VMObject::Bytes(b) => b.len() as i64,
            VMObject::String(s) => s.as_bytes().len() as i64,
            VMObject::Struct(fields) => fields.len() as i64,
            other => {
                return Err(VmError::TypeMismatch {
                    expected: "bytes, string, or struct",
                    actual: other.type_name(),
                })
            }
        })
    }

    pub fn as_i64(&self) -> VmResult<i64> {
        self.as_int()?
            .to_i64()
            .ok_or_else(|| VmError::BoundsViolation("integer does not fit in i64".to_string()))
    }

    pub fn sign(&self) -> VmResult<i64> {
        let i = self.as_int()?;
        Ok(if i.is_positive() {
            1
        } else if i.is_negative() {
            -1
        } else {
            0
        })
    }
}

impl From<bool> for VMObject {
    fn from(v: bool) -> Self {
        VMObject::Bool(v)
    }
}

impl From<BigInt> for VMObject {
    fn from(v: BigInt) -> Self {
        VMObject::Int(v)
    }
}

impl From<i64> for VMObject {
    fn from(v: i64) -> Self {
        VMObject::Int(BigInt::from(v))
    }
}

impl From<Vec<u8>> for VMObject {
    fn from(v: Vec<u8>) -> Self {
        VMObject::Bytes(v)
    }
}

impl From<String> for VMObject {
    fn from(v: String) -> Self {
        VMObject::String(v)
    }
}

impl From<Address> for VMObject {
    fn from(v: Address) -> Self {
        VMObject::Address(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_to_int_rejects_over_32_bytes() {
        let big = VMObject::Bytes(vec![1u8; 33]);
        assert!(big.as_int().is_err());
        let ok = VMObject::Bytes(vec![1u8; 32]);
        assert!(ok.as_int().is_ok());
    }

    #[test]
    fn struct_field_accessors_round_trip() {
        let mut s = VMObject::Struct(vec![VMObject::from(1i64), VMObject::from(2i64)]);
        assert_eq!(s.get_field(1).unwrap(), VMObject::from(2i64));
        s.set_field(1, VMObject::from(99i64)).unwrap();
        assert_eq!(s.get_field(1).unwrap(), VMObject::from(99i64));
    }

    #[test]
    fn sign_matches_value() {
        assert_eq!(VMObject::from(5i64).sign().unwrap(), 1);
        assert_eq!(VMObject::from(-5i64).sign().unwrap(), -1);
        assert_eq!(VMObject::from(0i64).sign().unwrap(), 0);
    }
}
