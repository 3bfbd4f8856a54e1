//! rdPoS validation errors.

use rdchain_types::Address;
use thiserror::Error;

pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

#[derive(Error, Debug)]
pub enum RdPosError {
    #[error("fewer than {min} validators configured, have {have}")]
    NotEnoughValidators { min: usize, have: usize },
    #[error("voter {0} is not in the current validator set")]
    UnknownVoter(Address),
    #[error("{0} already voted for this height and round")]
    DuplicateVote(Address),
    #[error("reveal does not match any known commit")]
    RevealWithoutCommit,
    #[error("block was not signed by the expected proposer {expected}, got {found}")]
    WrongProposer { expected: Address, found: Address },
    #[error("block signature could not be recovered")]
    UnrecoverableSignature,
    #[error("block randomness does not match the recomputed value from reveal votes")]
    RandomnessMismatch,
    #[error("block carries fewer validator votes than the minimum randomizer count")]
    NotEnoughRandomizers,
    #[error("vote height {found} does not match the current round's height {expected}")]
    WrongVoteHeight { expected: u64, found: u64 },
    #[error("block carries {found} validator votes, expected exactly {expected}")]
    WrongValidatorTxCount { expected: usize, found: usize },
    #[error("validator tx at position {position} is not a commit")]
    ExpectedCommit { position: usize },
    #[error("validator tx at position {position} is not a reveal")]
    ExpectedReveal { position: usize },
    #[error("randomizer at position {position} should be {expected}, found {found}")]
    WrongRandomizer {
        position: usize,
        expected: Address,
        found: Address,
    },
    #[error("reveal from {0} does not match its commit")]
    RevealCommitMismatch(Address),
    #[error("block type error: {0}")]
    Tx(#[from] rdchain_tx::TxError),
}

impl ErrorCode for RdPosError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotEnoughValidators { .. } => "RDPOS_NOT_ENOUGH_VALIDATORS",
            Self::UnknownVoter(_) => "RDPOS_UNKNOWN_VOTER",
            Self::DuplicateVote(_) => "RDPOS_DUPLICATE_VOTE",
            Self::RevealWithoutCommit => "RDPOS_REVEAL_WITHOUT_COMMIT",
            Self::WrongProposer { .. } => "RDPOS_WRONG_PROPOSER",
            Self::UnrecoverableSignature => "RDPOS_UNRECOVERABLE_SIGNATURE",
            Self::RandomnessMismatch => "RDPOS_RANDOMNESS_MISMATCH",
            Self::NotEnoughRandomizers => "RDPOS_NOT_ENOUGH_RANDOMIZERS",
            Self::WrongVoteHeight { .. } => "RDPOS_WRONG_VOTE_HEIGHT",
            Self::WrongValidatorTxCount { .. } => "RDPOS_WRONG_VALIDATOR_TX_COUNT",
            Self::ExpectedCommit { .. } => "RDPOS_EXPECTED_COMMIT",
            Self::ExpectedReveal { .. } => "RDPOS_EXPECTED_REVEAL",
            Self::WrongRandomizer { .. } => "RDPOS_WRONG_RANDOMIZER",
            Self::RevealCommitMismatch(_) => "RDPOS_REVEAL_COMMIT_MISMATCH",
            Self::Tx(_) => "RDPOS_TX_ERROR",
        }
    }
}
