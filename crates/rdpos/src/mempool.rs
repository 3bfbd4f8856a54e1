//! Pending validator votes (commits and reveals), keyed by transaction hash.

use crate::error::RdPosError;
use rdchain_tx::{TxError, TxValidator};
use rdchain_types::{Address, Hash};
use std::collections::HashMap;

#[derive(Default)]
pub struct ValidatorMempool {
    votes: HashMap<Hash, TxValidator>,
}

impl ValidatorMempool {
    pub fn new() -> Self {
        ValidatorMempool {
            votes: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Validates and admits a vote. Rejects votes for any height other than
    /// the current round's (`expected_height`), votes from senders outside
    /// the current round's randomizer subset (`randomizers` — this excludes
    /// the proposer, who never commits or reveals), duplicate votes of the
    /// same kind from the same address at the same height, reveals with no
    /// matching commit already in the pool, and anything that isn't a
    /// recognized commit or reveal selector.
    pub fn add_validator_tx(
        &mut self,
        tx: TxValidator,
        randomizers: &[Address],
        expected_height: u64,
    ) -> Result<(), RdPosError> {
        if tx.n_height != expected_height {
            return Err(RdPosError::WrongVoteHeight {
                expected: expected_height,
                found: tx.n_height,
            });
        }
        if !randomizers.contains(&tx.from) {
            return Err(RdPosError::UnknownVoter(tx.from));
        }

        let is_commit = tx.as_commit().is_some();
        let is_reveal = tx.as_reveal().is_some();
        if !is_commit && !is_reveal {
            return Err(RdPosError::Tx(TxError::UnknownSelector));
        }

        let duplicate = self.votes.values().any(|existing| {
            existing.from == tx.from
                && existing.n_height == tx.n_height
                && existing.as_commit().is_some() == is_commit
        });
        if duplicate {
            return Err(RdPosError::DuplicateVote(tx.from));
        }

        if is_reveal {
            let links_to_known_commit = self.votes.values().any(|existing| tx.reveals(existing));
            if !links_to_known_commit {
                return Err(RdPosError::RevealWithoutCommit);
            }
        }

        self.votes.insert(tx.hash(), tx);
        Ok(())
    }

    /// Drops every vote for a height at or below `finalized_height`; those
    /// rounds are over and stale votes would otherwise accumulate forever.
    pub fn prune_stale(&mut self, finalized_height: u64) {
        self.votes.retain(|_, tx| tx.n_height > finalized_height);
    }

    pub fn votes(&self) -> impl Iterator<Item = &TxValidator> {
        self.votes.values()
    }

    pub fn reveals_for_height(&self, height: u64) -> Vec<&TxValidator> {
        self.votes
            .values()
            .filter(|tx| tx.n_height == height && tx.as_reveal().is_some())
            .collect()
    }

    pub fn commits_for_height(&self, height: u64) -> Vec<&TxValidator> {
        self.votes
            .values()
            .filter(|tx| tx.n_height == height && tx.as_commit().is_some())
            .collect()
    }
}
