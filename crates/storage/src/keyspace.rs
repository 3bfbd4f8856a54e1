//! `redb` table definitions, one per keyspace, and their key encodings.

use redb::TableDefinition;

/// Block hash (32 bytes) -> database-encoded `FinalizedBlock` bytes.
pub const BLOCKS: TableDefinition<&[u8; 32], &[u8]> = TableDefinition::new("blocks");
/// Height (8-byte big-endian) -> block hash.
pub const BLOCK_HEIGHT_MAPS: TableDefinition<&[u8; 8], &[u8; 32]> =
    TableDefinition::new("blockHeightMaps");
/// Transaction hash (32 bytes) -> owning block hash.
pub const TX_TO_BLOCKS: TableDefinition<&[u8; 32], &[u8; 32]> = TableDefinition::new("txToBlocks");
/// Address (20 bytes) -> opaque account bytes, interpreted by `rdchain-state`.
pub const NATIVE_ACCOUNTS: TableDefinition<&[u8; 20], &[u8]> = TableDefinition::new("nativeAccounts");
/// Validator set index (4-byte big-endian) -> address (20 bytes).
pub const VALIDATORS: TableDefinition<&[u8; 4], &[u8; 20]> = TableDefinition::new("validators");
/// Singleton metadata table; currently holds only `b"latest"` -> block hash.
pub const META: TableDefinition<&[u8], &[u8]> = TableDefinition::new("meta");

pub const LATEST_KEY: &[u8] = b"latest";

pub fn height_key(height: u64) -> [u8; 8] {
    height.to_be_bytes()
}

pub fn validator_index_key(index: u32) -> [u8; 4] {
    index.to_be_bytes()
}
