//! Shared helpers layered on top of the `rlp` crate for the canonical
//! transaction encodings used throughout rdchain.

use crate::error::TypesError;
use rlp::Rlp;

/// Rejects any buffer whose outer RLP length prefix does not account for
/// every remaining byte — i.e. there is trailing garbage after the single
/// top-level list item, or the prefix overstates/understates the payload.
pub fn ensure_exact_consumption(rlp: &Rlp, total_len: usize) -> Result<(), TypesError> {
    let info = rlp
        .payload_info()
        .map_err(|e| TypesError::InvalidSignature(format!("malformed rlp header: {e}")))?;
    let consumed = info.header_len + info.value_len;
    if consumed != total_len {
        return Err(TypesError::InvalidSignature(format!(
            "rlp length prefix ({consumed}) does not match payload length ({total_len})"
        )));
    }
    Ok(())
}

/// EIP-155: `v = chain_id * 2 + 35 + recovery_parity`. Per spec, only
/// `v > 36` is accepted as EIP-155; legacy `v ∈ {27, 28}` (and anything else
/// at or below 36) is rejected, since this core requires EIP-155.
pub fn chain_id_from_v(v: u64) -> Option<u64> {
    if v > 36 {
        Some((v - 35) / 2)
    } else {
        None
    }
}

/// Inverse of [`chain_id_from_v`]: builds the EIP-155 `v` value from a
/// chain id and a `{0,1}` recovery parity.
pub fn v_from_chain_id(chain_id: u64, parity: u8) -> u64 {
    chain_id * 2 + 35 + parity as u64
}

/// Recovers the `{0,1}` ECDSA recovery parity encoded in an EIP-155 `v`.
pub fn recovery_parity_from_v(v: u64) -> u8 {
    ((v - 35) % 2) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eip155_v_roundtrips() {
        let chain_id = 137u64;
        for parity in [0u8, 1u8] {
            let v = v_from_chain_id(chain_id, parity);
            assert_eq!(chain_id_from_v(v), Some(chain_id));
            assert_eq!(recovery_parity_from_v(v), parity);
        }
    }

    #[test]
    fn legacy_v_has_no_chain_id() {
        assert_eq!(chain_id_from_v(27), None);
        assert_eq!(chain_id_from_v(28), None);
    }
}
