//! Canonical fixed-width big-endian integer encoding.
//!
//! Decoding any of these with a mismatched byte length fails, per
//! `spec.md` §4.1.

use crate::error::TypesError;

macro_rules! fixed_width_int {
    ($encode:ident, $decode:ident, $ty:ty, $width:expr) => {
        pub fn $encode(value: $ty) -> [u8; $width] {
            value.to_be_bytes()
        }

        pub fn $decode(bytes: &[u8]) -> Result<$ty, TypesError> {
            if bytes.len() != $width {
                return Err(TypesError::LengthMismatch {
                    what: stringify!($ty),
                    expected: $width,
                    got: bytes.len(),
                });
            }
            let mut buf = [0u8; $width];
            buf.copy_from_slice(bytes);
            Ok(<$ty>::from_be_bytes(buf))
        }
    };
}

fixed_width_int!(encode_u8, decode_u8, u8, 1);
fixed_width_int!(encode_u16, decode_u16, u16, 2);
fixed_width_int!(encode_u32, decode_u32, u32, 4);
fixed_width_int!(encode_u64, decode_u64, u64, 8);

/// Encodes a 20-byte address-shaped value; purely a length-checked pass-through.
pub fn encode_20(bytes: &[u8; 20]) -> [u8; 20] {
    *bytes
}

pub fn decode_20(bytes: &[u8]) -> Result<[u8; 20], TypesError> {
    if bytes.len() != 20 {
        return Err(TypesError::LengthMismatch {
            what: "bytes20",
            expected: 20,
            got: bytes.len(),
        });
    }
    let mut out = [0u8; 20];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Encodes a 32-byte hash-shaped value; purely a length-checked pass-through.
pub fn encode_32(bytes: &[u8; 32]) -> [u8; 32] {
    *bytes
}

pub fn decode_32(bytes: &[u8]) -> Result<[u8; 32], TypesError> {
    if bytes.len() != 32 {
        return Err(TypesError::LengthMismatch {
            what: "bytes32",
            expected: 32,
            got: bytes.len(),
        });
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_roundtrips() {
        let v: u64 = 0x0102_0304_0506_0708;
        let enc = encode_u64(v);
        assert_eq!(decode_u64(&enc).unwrap(), v);
    }

    #[test]
    fn decode_rejects_wrong_width() {
        assert!(decode_u32(&[1, 2, 3]).is_err());
        assert!(decode_u32(&[1, 2, 3, 4, 5]).is_err());
    }
}
