//! Storage errors.

use thiserror::Error;

pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("redb backend error: {0}")]
    Backend(String),
    #[error("stored block failed to decode: {0}")]
    Decode(#[from] rdchain_block::BlockError),
    #[error("requested item not found")]
    NotFound,
    #[error("storage invariant violated: {0}")]
    Invariant(String),
}

impl ErrorCode for StorageError {
    fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "STORAGE_BACKEND",
            Self::Decode(_) => "STORAGE_DECODE_FAILED",
            Self::NotFound => "STORAGE_NOT_FOUND",
            Self::Invariant(_) => "STORAGE_INVARIANT_VIOLATION",
        }
    }
}

impl From<redb::Error> for StorageError {
    fn from(e: redb::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(e: redb::TransactionError) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<redb::TableError> for StorageError {
    fn from(e: redb::TableError) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(e: redb::StorageError) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(e: redb::CommitError) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<redb::DatabaseError> for StorageError {
    fn from(e: redb::DatabaseError) -> Self {
        StorageError::Backend(e.to_string())
    }
}
