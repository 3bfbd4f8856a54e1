//! Validator rotation and block validation.

use crate::constants::MIN_VALIDATORS;
use crate::error::RdPosError;
use crate::mempool::ValidatorMempool;
use crate::random_gen::RandomGen;
use rdchain_block::FinalizedBlock;
use rdchain_tx::TxValidator;
use rdchain_types::{Address, Hash};

/// The current round's validator order is cached, not recomputed on demand:
/// `RandomGen::shuffle` consumes the random stream as it runs, so asking
/// "who's the proposer" twice must not silently draw twice. The order only
/// advances when [`RdPos::process_block`] rotates to the next round.
pub struct RdPos {
    validators: Vec<Address>,
    gen: RandomGen,
    current_order: Vec<Address>,
    mempool: ValidatorMempool,
    min_validators: usize,
    /// The height votes currently admitted into `mempool` must carry —
    /// i.e. the height of the block this round is building towards.
    current_height: u64,
}

impl RdPos {
    pub fn new(seed: Hash, validators: Vec<Address>, current_height: u64) -> Result<Self, RdPosError> {
        if validators.len() < MIN_VALIDATORS {
            return Err(RdPosError::NotEnoughValidators {
                min: MIN_VALIDATORS,
                have: validators.len(),
            });
        }
        let mut gen = RandomGen::new(seed);
        let mut current_order = validators.clone();
        gen.shuffle(&mut current_order);
        Ok(RdPos {
            validators,
            gen,
            current_order,
            mempool: ValidatorMempool::new(),
            min_validators: MIN_VALIDATORS,
            current_height,
        })
    }

    pub fn current_height(&self) -> u64 {
        self.current_height
    }

    pub fn validators(&self) -> &[Address] {
        &self.validators
    }

    pub fn set_validators(&mut self, validators: Vec<Address>) -> Result<(), RdPosError> {
        if validators.len() < self.min_validators {
            return Err(RdPosError::NotEnoughValidators {
                min: self.min_validators,
                have: validators.len(),
            });
        }
        self.validators = validators;
        self.current_order = self.validators.clone();
        self.gen.shuffle(&mut self.current_order);
        Ok(())
    }

    pub fn mempool(&self) -> &ValidatorMempool {
        &self.mempool
    }

    pub fn add_validator_tx(&mut self, tx: TxValidator) -> Result<(), RdPosError> {
        let randomizers = self.randomizers().to_vec();
        self.mempool.add_validator_tx(tx, &randomizers, self.current_height)
    }

    pub fn seed(&self) -> Hash {
        self.gen.seed()
    }

    /// The validator order for the current round. `current_order()[0]` is
    /// the proposer; `current_order()[1..=min_validators]` are the
    /// randomizers.
    pub fn current_order(&self) -> &[Address] {
        &self.current_order
    }

    pub fn proposer(&self) -> Option<Address> {
        self.current_order.first().copied()
    }

    pub fn randomizers(&self) -> &[Address] {
        let end = (1 + self.min_validators).min(self.current_order.len());
        self.current_order.get(1..end).unwrap_or(&[])
    }

    pub fn is_randomizer(&self, addr: Address) -> bool {
        self.randomizers().contains(&addr)
    }

    /// Verifies a proposed block: the proposer's signature over the unsigned
    /// header, and that `validator_txs` is exactly the canonical
    /// `MIN_VALIDATORS` commits followed by `MIN_VALIDATORS` reveals, each
    /// pair at position `i` sent by `randomizers()[i]` and the reveal
    /// unlocking that exact commit, and that the block's randomness matches
    /// those reveals.
    pub fn validate_block(&self, block: &FinalizedBlock) -> Result<(), RdPosError> {
        let expected_proposer = self.proposer().ok_or(RdPosError::NotEnoughValidators {
            min: self.min_validators,
            have: self.current_order.len(),
        })?;

        let unsigned_hash = block.header.hash(false);
        let upub = rdchain_crypto::recover(block.header.sig.as_bytes(), unsigned_hash.as_bytes())
            .ok_or(RdPosError::UnrecoverableSignature)?;
        let signer = Address::from_uncompressed_pubkey(&upub);
        if signer != expected_proposer {
            return Err(RdPosError::WrongProposer {
                expected: expected_proposer,
                found: signer,
            });
        }

        let randomizers = self.randomizers();
        if randomizers.len() < self.min_validators {
            return Err(RdPosError::NotEnoughRandomizers);
        }

        let expected_total = 2 * self.min_validators;
        if block.validator_txs.len() != expected_total {
            return Err(RdPosError::WrongValidatorTxCount {
                expected: expected_total,
                found: block.validator_txs.len(),
            });
        }
        let commits = block
            .validator_txs
            .get(0..self.min_validators)
            .ok_or(RdPosError::WrongValidatorTxCount {
                expected: expected_total,
                found: block.validator_txs.len(),
            })?;
        let reveals = block
            .validator_txs
            .get(self.min_validators..expected_total)
            .ok_or(RdPosError::WrongValidatorTxCount {
                expected: expected_total,
                found: block.validator_txs.len(),
            })?;

        for (position, expected_voter) in randomizers.iter().enumerate().take(self.min_validators) {
            let commit = commits.get(position).ok_or(RdPosError::WrongValidatorTxCount {
                expected: expected_total,
                found: block.validator_txs.len(),
            })?;
            if commit.as_commit().is_none() {
                return Err(RdPosError::ExpectedCommit { position });
            }
            if commit.from != *expected_voter {
                return Err(RdPosError::WrongRandomizer {
                    position,
                    expected: *expected_voter,
                    found: commit.from,
                });
            }

            let reveal = reveals.get(position).ok_or(RdPosError::WrongValidatorTxCount {
                expected: expected_total,
                found: block.validator_txs.len(),
            })?;
            if reveal.as_reveal().is_none() {
                return Err(RdPosError::ExpectedReveal { position });
            }
            if reveal.from != *expected_voter {
                return Err(RdPosError::WrongRandomizer {
                    position,
                    expected: *expected_voter,
                    found: reveal.from,
                });
            }
            if !reveal.reveals(commit) {
                return Err(RdPosError::RevealCommitMismatch(*expected_voter));
            }
        }

        let recomputed = recompute_randomness(&block.validator_txs);
        if recomputed != block.header.randomness {
            return Err(RdPosError::RandomnessMismatch);
        }

        Ok(())
    }

    /// Advances protocol state once a block has been accepted: the next
    /// round's seed becomes this block's randomness, the validator order is
    /// reshuffled from that seed, the round height advances, and mempool
    /// votes for this height or earlier are pruned.
    pub fn process_block(&mut self, block: &FinalizedBlock) {
        self.gen.set_seed(block.header.randomness);
        self.current_order = self.validators.clone();
        self.gen.shuffle(&mut self.current_order);
        self.current_height = block.header.n_height + 1;
        self.mempool.prune_stale(block.header.n_height);
    }
}

/// Folds reveal secrets, in `validator_txs` order, into the next round's
/// seed. Callers must have already arranged `validator_txs` so the reveal
/// half is in canonical `randomizers()` order — `validate_block` enforces
/// this on every accepted block, and `create_new_block` assembles it that
/// way in the first place.
pub fn recompute_randomness(validator_txs: &[TxValidator]) -> Hash {
    let mut buf = Vec::new();
    for tx in validator_txs {
        if let Some(secret) = tx.as_reveal() {
            buf.extend_from_slice(secret);
        }
    }
    Hash::from_bytes(rdchain_crypto::keccak256(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdchain_block::Block;
    use rdchain_types::PrivKey;

    fn validator_keys(n: usize) -> Vec<PrivKey> {
        (0..n).map(|i| PrivKey::from_bytes([i as u8 + 1; 32])).collect()
    }

    /// Builds a well-formed `validator_txs` sequence for `rdpos`'s current
    /// round: `MIN_VALIDATORS` commits in `randomizers()` order, then the
    /// matching reveals in the same order, each secret derived from its
    /// randomizer's position so every reveal unlocks its own commit.
    fn canonical_validator_txs(rdpos: &RdPos, keys: &[PrivKey], height: u64) -> Vec<TxValidator> {
        let key_for = |addr: Address| {
            keys.iter().find(|k| k.derive_address().unwrap() == addr).unwrap()
        };
        let secret_for = |addr: Address| {
            let mut secret = [0u8; 32];
            secret[0..8].copy_from_slice(&u64::from(addr.as_bytes()[0]).to_be_bytes());
            secret
        };
        let mut txs = Vec::new();
        for addr in rdpos.randomizers() {
            let secret = secret_for(*addr);
            txs.push(TxValidator::new_commit(&secret, height, 1, key_for(*addr)).unwrap());
        }
        for addr in rdpos.randomizers() {
            let secret = secret_for(*addr);
            txs.push(TxValidator::new_reveal(&secret, height, 1, key_for(*addr)).unwrap());
        }
        txs
    }

    #[test]
    fn current_order_is_deterministic_for_same_seed() {
        let keys = validator_keys(4);
        let addrs: Vec<Address> = keys.iter().map(|k| k.derive_address().unwrap()).collect();
        let a = RdPos::new(Hash::zero(), addrs.clone(), 1).unwrap();
        let b = RdPos::new(Hash::zero(), addrs, 1).unwrap();
        assert_eq!(a.current_order(), b.current_order());
    }

    #[test]
    fn rejects_too_few_validators() {
        let keys = validator_keys(2);
        let addrs: Vec<Address> = keys.iter().map(|k| k.derive_address().unwrap()).collect();
        assert!(matches!(
            RdPos::new(Hash::zero(), addrs, 1),
            Err(RdPosError::NotEnoughValidators { .. })
        ));
    }

    #[test]
    fn validates_well_formed_block_and_rejects_wrong_proposer() {
        // 5 validators so the proposer's slot leaves a full 4-address
        // randomizer subset.
        let keys = validator_keys(5);
        let addrs: Vec<Address> = keys.iter().map(|k| k.derive_address().unwrap()).collect();
        let rdpos = RdPos::new(Hash::zero(), addrs, 1).unwrap();
        let proposer_addr = rdpos.proposer().unwrap();
        let proposer_key = keys
            .iter()
            .find(|k| k.derive_address().unwrap() == proposer_addr)
            .unwrap();

        let mut block = Block::new(1, Hash::zero(), 1);
        for tx in canonical_validator_txs(&rdpos, &keys, 1) {
            block.append_validator_tx(tx).unwrap();
        }
        let finalized = block.finalize(proposer_key, 1_000).unwrap();
        assert!(rdpos.validate_block(&finalized).is_ok());
    }

    #[test]
    fn rejects_block_signed_by_non_proposer() {
        let keys = validator_keys(4);
        let addrs: Vec<Address> = keys.iter().map(|k| k.derive_address().unwrap()).collect();
        let rdpos = RdPos::new(Hash::zero(), addrs, 1).unwrap();
        let proposer_addr = rdpos.proposer().unwrap();
        let impostor_key = keys
            .iter()
            .find(|k| k.derive_address().unwrap() != proposer_addr)
            .unwrap();

        let mut block = Block::new(1, Hash::zero(), 1);
        for (i, key) in keys.iter().enumerate() {
            let secret = [i as u8 + 10; 32];
            block
                .append_validator_tx(TxValidator::new_reveal(&secret, 1, 1, key).unwrap())
                .unwrap();
        }
        let finalized = block.finalize(impostor_key, 1_000).unwrap();
        assert!(matches!(
            rdpos.validate_block(&finalized),
            Err(RdPosError::WrongProposer { .. })
        ));
    }

    #[test]
    fn process_block_rotates_seed_and_order_and_prunes_mempool() {
        let keys = validator_keys(4);
        let addrs: Vec<Address> = keys.iter().map(|k| k.derive_address().unwrap()).collect();
        let mut rdpos = RdPos::new(Hash::zero(), addrs, 1).unwrap();
        let randomizer_addr = rdpos.randomizers()[0];
        let randomizer_key = keys
            .iter()
            .find(|k| k.derive_address().unwrap() == randomizer_addr)
            .unwrap();
        let proposer_addr = rdpos.proposer().unwrap();
        let proposer_key = keys
            .iter()
            .find(|k| k.derive_address().unwrap() == proposer_addr)
            .unwrap();

        rdpos
            .add_validator_tx(TxValidator::new_commit(&[1u8; 32], 1, 1, randomizer_key).unwrap())
            .unwrap();

        let mut block = Block::new(1, Hash::zero(), 1);
        for (i, key) in keys.iter().enumerate() {
            let secret = [i as u8 + 20; 32];
            block
                .append_validator_tx(TxValidator::new_reveal(&secret, 1, 1, key).unwrap())
                .unwrap();
        }
        let finalized = block.finalize(proposer_key, 1_000).unwrap();

        let order_before = rdpos.current_order().to_vec();
        rdpos.process_block(&finalized);
        assert_eq!(rdpos.seed(), finalized.header.randomness);
        assert_ne!(rdpos.current_order().to_vec(), order_before);
        assert_eq!(rdpos.current_height(), 2);
        assert!(rdpos.mempool().commits_for_height(1).is_empty());
    }
}
