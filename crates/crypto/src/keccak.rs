//! keccak256 hashing.

use tiny_keccak::{Hasher, Keccak};

/// Hashes arbitrary bytes with keccak256.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Hashes the concatenation of several byte slices without allocating an
/// intermediate buffer, used for the block randomness commitment.
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_vector() {
        // keccak256("") per the canonical test vector used throughout the
        // Ethereum ecosystem.
        let got = keccak256(b"");
        let want =
            hex::decode("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
                .unwrap();
        assert_eq!(got.to_vec(), want);
    }

    #[test]
    fn concat_matches_manual_concat() {
        let a = keccak256_concat(&[b"foo", b"bar"]);
        let mut buf = Vec::new();
        buf.extend_from_slice(b"foo");
        buf.extend_from_slice(b"bar");
        let b = keccak256(&buf);
        assert_eq!(a, b);
    }
}
