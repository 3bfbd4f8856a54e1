//! secp256k1 sign / recover / verify with Ethereum-style low-s normalization.

use crate::error::CryptoError;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

/// The secp256k1 curve order `n`, big-endian.
pub const SECP256K1_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

/// The half-order `n / 2`, used to decide whether `s` needs flipping to its
/// canonical low-s form.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

fn be_sub(n: &[u8; 32], x: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut borrow = 0i32;
    for i in (0..32).rev() {
        let diff = n[i] as i32 - x[i] as i32 - borrow;
        if diff < 0 {
            out[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            out[i] = diff as u8;
            borrow = 0;
        }
    }
    out
}

fn is_zero(x: &[u8; 32]) -> bool {
    x.iter().all(|b| *b == 0)
}

/// `true` iff `0 < x < n`, i.e. `x` is a valid non-zero scalar for the curve.
pub fn in_curve_order(x: &[u8; 32]) -> bool {
    !is_zero(x) && x.as_slice() < SECP256K1_ORDER.as_slice()
}

/// Produces a 65-byte signature `r(32) || s(32) || v(1)` in low-s canonical
/// form. `v` is normalized to `{0, 1}`.
pub fn sign(msg_hash: &[u8; 32], priv_key: &[u8; 32]) -> Result<[u8; 65], CryptoError> {
    let secp = Secp256k1::signing_only();
    let secret = SecretKey::from_slice(priv_key)
        .map_err(|e| CryptoError::SignFailed(e.to_string()))?;
    let message = Message::from_slice(msg_hash).expect("msg_hash is 32 bytes");
    let recoverable: RecoverableSignature = secp.sign_ecdsa_recoverable(&message, &secret);
    let (recovery_id, compact) = recoverable.serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[0..32]);
    s.copy_from_slice(&compact[32..64]);
    let mut v = recovery_id.to_i32() as u8;

    if s.as_slice() > SECP256K1_HALF_ORDER.as_slice() {
        s = be_sub(&SECP256K1_ORDER, &s);
        v ^= 1;
    }

    let mut out = [0u8; 65];
    out[0..32].copy_from_slice(&r);
    out[32..64].copy_from_slice(&s);
    out[64] = v;
    Ok(out)
}

/// Recovers the 65-byte uncompressed public key that produced `sig` over
/// `msg_hash`. Returns `None` if `v > 3` or recovery fails, per spec.
pub fn recover(sig: &[u8; 65], msg_hash: &[u8; 32]) -> Option<[u8; 65]> {
    let v = sig[64];
    if v > 3 {
        return None;
    }
    let recovery_id = RecoveryId::from_i32((v & 1) as i32).ok()?;
    let mut compact = [0u8; 64];
    compact[0..32].copy_from_slice(&sig[0..32]);
    compact[32..64].copy_from_slice(&sig[32..64]);
    let recoverable = RecoverableSignature::from_compact(&compact, recovery_id).ok()?;

    let secp = Secp256k1::verification_only();
    let message = Message::from_slice(msg_hash).ok()?;
    let pubkey: PublicKey = secp.recover_ecdsa(&message, &recoverable).ok()?;
    Some(pubkey.serialize_uncompressed())
}

/// Verifies `sig` over `msg_hash` against the 65-byte uncompressed public
/// key `upub`, after normalizing `s` to low-s form.
pub fn verify(msg_hash: &[u8; 32], upub: &[u8; 65], sig: &[u8; 65]) -> bool {
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&sig[0..32]);
    s.copy_from_slice(&sig[32..64]);
    if s.as_slice() > SECP256K1_HALF_ORDER.as_slice() {
        s = be_sub(&SECP256K1_ORDER, &s);
    }

    let secp = Secp256k1::verification_only();
    let pubkey = match PublicKey::from_slice(upub) {
        Ok(p) => p,
        Err(_) => return false,
    };
    let mut compact = [0u8; 64];
    compact[0..32].copy_from_slice(&r);
    compact[32..64].copy_from_slice(&s);
    let signature = match secp256k1::ecdsa::Signature::from_compact(&compact) {
        Ok(s) => s,
        Err(_) => return false,
    };
    let message = match Message::from_slice(msg_hash) {
        Ok(m) => m,
        Err(_) => return false,
    };
    secp.verify_ecdsa(&message, &signature, &pubkey).is_ok()
}

/// Derives a 33-byte compressed public key from a private key.
pub fn derive_pubkey(priv_key: &[u8; 32]) -> Result<[u8; 33], CryptoError> {
    let secp = Secp256k1::signing_only();
    let secret =
        SecretKey::from_slice(priv_key).map_err(|e| CryptoError::SignFailed(e.to_string()))?;
    let public = PublicKey::from_secret_key(&secp, &secret);
    Ok(public.serialize())
}

/// Derives the 65-byte uncompressed public key from a private key.
pub fn derive_upubkey(priv_key: &[u8; 32]) -> Result<[u8; 65], CryptoError> {
    let secp = Secp256k1::signing_only();
    let secret =
        SecretKey::from_slice(priv_key).map_err(|e| CryptoError::SignFailed(e.to_string()))?;
    let public = PublicKey::from_secret_key(&secp, &secret);
    Ok(public.serialize_uncompressed())
}

/// Derives a 20-byte address from a 65-byte uncompressed public key:
/// `keccak256(pubkey[1..65])[12..32]`.
pub fn upub_to_address(upub: &[u8; 65]) -> [u8; 20] {
    let digest = crate::keccak::keccak256(&upub[1..65]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest[12..32]);
    addr
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn random_priv() -> [u8; 32] {
        loop {
            let mut buf = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut buf);
            if in_curve_order(&buf) {
                return buf;
            }
        }
    }

    #[test]
    fn sign_then_recover_roundtrips() {
        let priv_key = random_priv();
        let upub = derive_upubkey(&priv_key).unwrap();
        let msg = crate::keccak::keccak256(b"hello rdchain");

        let sig = sign(&msg, &priv_key).unwrap();
        assert!(sig[64] <= 1, "v must be normalized to 0 or 1");

        let recovered = recover(&sig, &msg).expect("recovery should succeed");
        assert_eq!(recovered, upub);
        assert!(verify(&msg, &upub, &sig));
    }

    #[test]
    fn recover_rejects_v_greater_than_three() {
        let mut sig = [0u8; 65];
        sig[64] = 4;
        assert!(recover(&sig, &[0u8; 32]).is_none());
    }

    #[test]
    fn signatures_are_low_s() {
        let priv_key = random_priv();
        let msg = crate::keccak::keccak256(b"low-s check");
        let sig = sign(&msg, &priv_key).unwrap();
        let mut s = [0u8; 32];
        s.copy_from_slice(&sig[32..64]);
        assert!(s.as_slice() <= SECP256K1_HALF_ORDER.as_slice());
    }

    #[test]
    fn address_derivation_matches_spec_formula() {
        let priv_key = random_priv();
        let upub = derive_upubkey(&priv_key).unwrap();
        let addr = upub_to_address(&upub);
        let expected = crate::keccak::keccak256(&upub[1..65]);
        assert_eq!(addr.as_slice(), &expected[12..32]);
    }
}
