//! Fixed-size key material wrappers.

use crate::error::TypesError;

macro_rules! fixed_bytes_key {
    ($name:ident, $len:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                $name(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
                if bytes.len() != $len {
                    return Err(TypesError::LengthMismatch {
                        what: stringify!($name),
                        expected: $len,
                        got: bytes.len(),
                    });
                }
                let mut out = [0u8; $len];
                out.copy_from_slice(bytes);
                Ok($name(out))
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}(..)", stringify!($name))
            }
        }
    };
}

fixed_bytes_key!(PrivKey, 32, "A 32-byte secp256k1 private key.");
fixed_bytes_key!(PubKey, 33, "A 33-byte compressed secp256k1 public key.");
fixed_bytes_key!(UPubKey, 65, "A 65-byte uncompressed secp256k1 public key.");

impl PrivKey {
    pub fn derive_pubkey(&self) -> Result<PubKey, rdchain_crypto::CryptoError> {
        rdchain_crypto::derive_pubkey(self.as_bytes()).map(PubKey::from_bytes)
    }

    pub fn derive_upubkey(&self) -> Result<UPubKey, rdchain_crypto::CryptoError> {
        rdchain_crypto::derive_upubkey(self.as_bytes()).map(UPubKey::from_bytes)
    }

    pub fn derive_address(&self) -> Result<crate::Address, rdchain_crypto::CryptoError> {
        let upub = self.derive_upubkey()?;
        Ok(crate::Address::from_uncompressed_pubkey(upub.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priv_key_derives_consistent_address() {
        let priv_key = PrivKey::from_bytes([3u8; 32]);
        let a1 = priv_key.derive_address().unwrap();
        let a2 = priv_key.derive_address().unwrap();
        assert_eq!(a1, a2);
    }
}
