//! Native account ledger entries.

use crate::error::StateError;
use ethereum_types::U256;

const ENCODED_LEN: usize = 36;

/// `{ balance: u256, nonce: u32 }`, stored as `balance(32) || nonce(4)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Account {
    pub balance: U256,
    pub nonce: u32,
}

impl Account {
    pub fn encode(&self) -> [u8; ENCODED_LEN] {
        let mut balance_bytes = [0u8; 32];
        self.balance.to_big_endian(&mut balance_bytes);
        let mut out = [0u8; ENCODED_LEN];
        let (balance_slot, nonce_slot) = out.split_at_mut(32);
        balance_slot.copy_from_slice(&balance_bytes);
        nonce_slot.copy_from_slice(&self.nonce.to_be_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StateError> {
        if bytes.len() != ENCODED_LEN {
            return Err(StateError::Corrupt {
                what: "native account",
                len: bytes.len(),
            });
        }
        let balance = U256::from_big_endian(bytes.get(0..32).ok_or(StateError::Corrupt {
            what: "native account balance",
            len: bytes.len(),
        })?);
        let nonce_bytes: [u8; 4] = bytes
            .get(32..36)
            .and_then(|s| s.try_into().ok())
            .ok_or(StateError::Corrupt {
                what: "native account nonce",
                len: bytes.len(),
            })?;
        let nonce = u32::from_be_bytes(nonce_bytes);
        Ok(Account { balance, nonce })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_bytes() {
        let acc = Account {
            balance: U256::from(123_456u64),
            nonce: 7,
        };
        let decoded = Account::decode(&acc.encode()).unwrap();
        assert_eq!(acc, decoded);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Account::decode(&[0u8; 10]).is_err());
    }
}
