//! `ChainStore`: a bounded in-memory hot window over a `redb`-backed durable
//! chain history.

use crate::error::StorageError;
use crate::keyspace::{
    height_key, validator_index_key, BLOCKS, BLOCK_HEIGHT_MAPS, LATEST_KEY, META,
    NATIVE_ACCOUNTS, TX_TO_BLOCKS, VALIDATORS,
};
use parking_lot::RwLock;
use rdchain_block::{FinalizedBlock, Header};
use rdchain_types::{Address, Hash, Signature};
use redb::{Database, ReadableTable};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc;

/// The default size of the in-memory hot window, matching `spec.md` §4.4's
/// "roughly 1000 blocks" figure.
pub const DEFAULT_WINDOW_CAPACITY: usize = 1000;

/// Inputs needed to synthesize the height-0 genesis block the first time a
/// store is opened against an empty database.
#[derive(Clone, Debug)]
pub struct GenesisConfig {
    pub timestamp: u64,
    pub validators: Vec<Address>,
}

enum PersistOp {
    WriteBlock {
        height: u64,
        hash: [u8; 32],
        db_bytes: Vec<u8>,
        tx_hashes: Vec<[u8; 32]>,
    },
}

pub struct ChainStore {
    db: Arc<Database>,
    chain_id: u64,
    window: Arc<RwLock<VecDeque<Arc<FinalizedBlock>>>>,
    window_capacity: usize,
    tx_sender: mpsc::Sender<PersistOp>,
    flusher: Option<JoinHandle<()>>,
}

fn genesis_block(chain_id: u64, genesis: &GenesisConfig) -> FinalizedBlock {
    let header = Header {
        prev_hash: Hash::zero(),
        sig: Signature::empty(),
        randomness: Hash::zero(),
        validator_tx_merkle_root: Hash::zero(),
        tx_merkle_root: Hash::zero(),
        timestamp: genesis.timestamp,
        n_height: 0,
        validator_tx_count: 0,
        tx_count: 0,
    };
    FinalizedBlock {
        chain_id,
        header,
        validator_txs: Vec::new(),
        txs: Vec::new(),
    }
}

impl ChainStore {
    pub fn open<P: AsRef<Path>>(
        path: P,
        chain_id: u64,
        genesis: GenesisConfig,
        window_capacity: usize,
    ) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref())?;

        let is_new = {
            let w = db.begin_write()?;
            let already_has_latest = {
                w.open_table(BLOCKS)?;
                w.open_table(BLOCK_HEIGHT_MAPS)?;
                w.open_table(TX_TO_BLOCKS)?;
                w.open_table(NATIVE_ACCOUNTS)?;
                w.open_table(VALIDATORS)?;
                let t = w.open_table(META)?;
                let has_latest = t.get(LATEST_KEY)?.is_some();
                has_latest
            };
            w.commit()?;
            !already_has_latest
        };

        let db = Arc::new(db);
        let mut window = VecDeque::with_capacity(window_capacity.min(DEFAULT_WINDOW_CAPACITY * 2));

        if is_new {
            let block = genesis_block(chain_id, &genesis);
            let hash = *block.hash().as_bytes();
            let db_bytes = block.serialize_db();
            persist_block(&db, 0, hash, &db_bytes, &[])?;

            let w = db.begin_write()?;
            {
                let mut validators_tbl = w.open_table(VALIDATORS)?;
                for (i, addr) in genesis.validators.iter().enumerate() {
                    let idx = u32::try_from(i).map_err(|_| {
                        StorageError::Invariant("genesis validator set too large".into())
                    })?;
                    validators_tbl.insert(&validator_index_key(idx), addr.as_bytes())?;
                }
            }
            w.commit()?;
            window.push_back(Arc::new(block));
        } else {
            load_hot_window(&db, chain_id, window_capacity, &mut window)?;
        }

        let (tx_sender, mut rx) = mpsc::channel::<PersistOp>(256);
        let db_for_thread = db.clone();
        let flusher = std::thread::spawn(move || {
            while let Some(op) = rx.blocking_recv() {
                match op {
                    PersistOp::WriteBlock {
                        height,
                        hash,
                        db_bytes,
                        tx_hashes,
                    } => {
                        if let Err(e) = persist_block(&db_for_thread, height, hash, &db_bytes, &tx_hashes) {
                            tracing::error!(error = %e, "background block persistence failed");
                        }
                    }
                }
            }
        });

        Ok(ChainStore {
            db,
            chain_id,
            window: Arc::new(RwLock::new(window)),
            window_capacity,
            tx_sender,
            flusher: Some(flusher),
        })
    }

    /// Appends a newly finalized block to the hot window and queues it for
    /// durable persistence. Does not itself validate consensus rules; callers
    /// (`rdchain-rdpos`/`rdchain-state`) are responsible for that.
    pub fn push_block(&self, block: Arc<FinalizedBlock>) -> Result<(), StorageError> {
        let height = block.header.n_height;
        let hash = *block.hash().as_bytes();
        let tx_hashes = block.txs.iter().map(|tx| *tx.hash().as_bytes()).collect();
        let db_bytes = block.serialize_db();

        {
            let mut window = self.window.write();
            window.push_back(block);
            while window.len() > self.window_capacity {
                window.pop_front();
            }
        }

        self.tx_sender
            .try_send(PersistOp::WriteBlock {
                height,
                hash,
                db_bytes,
                tx_hashes,
            })
            .map_err(|e| StorageError::Backend(format!("persistence queue full: {e}")))
    }

    /// Drops the most recently appended hot-window block without touching
    /// durable storage. Used to roll back a block that failed to apply after
    /// being tentatively appended.
    pub fn pop_back(&self) -> Option<Arc<FinalizedBlock>> {
        self.window.write().pop_back()
    }

    pub fn latest(&self) -> Result<Option<Arc<FinalizedBlock>>, StorageError> {
        if let Some(block) = self.window.read().back().cloned() {
            return Ok(Some(block));
        }
        let r = self.db.begin_read()?;
        let meta = r.open_table(META)?;
        let Some(latest) = meta.get(LATEST_KEY)? else {
            return Ok(None);
        };
        let mut hash = [0u8; 32];
        hash.copy_from_slice(latest.value());
        drop(latest);
        drop(meta);
        drop(r);
        self.get_block_by_hash(&Hash::from_bytes(hash))
    }

    pub fn get_block_by_hash(&self, hash: &Hash) -> Result<Option<Arc<FinalizedBlock>>, StorageError> {
        {
            let window = self.window.read();
            if let Some(block) = window.iter().find(|b| b.hash() == *hash) {
                return Ok(Some(block.clone()));
            }
        }
        let r = self.db.begin_read()?;
        let blocks = r.open_table(BLOCKS)?;
        let Some(bytes) = blocks.get(hash.as_bytes())? else {
            return Ok(None);
        };
        let block = FinalizedBlock::deserialize_db(bytes.value(), self.chain_id)?;
        Ok(Some(Arc::new(block)))
    }

    pub fn get_block_by_height(&self, height: u64) -> Result<Option<Arc<FinalizedBlock>>, StorageError> {
        {
            let window = self.window.read();
            if let Some(block) = window.iter().find(|b| b.header.n_height == height) {
                return Ok(Some(block.clone()));
            }
        }
        let hash = {
            let r = self.db.begin_read()?;
            let heights = r.open_table(BLOCK_HEIGHT_MAPS)?;
            let found = match heights.get(&height_key(height))? {
                Some(hash_bytes) => Some(Hash::from_bytes(*hash_bytes.value())),
                None => None,
            };
            drop(heights);
            drop(r);
            let Some(found) = found else {
                return Ok(None);
            };
            found
        };
        self.get_block_by_hash(&hash)
    }

    /// Looks up the block containing `tx_hash` and the transaction itself.
    pub fn get_tx(
        &self,
        tx_hash: &Hash,
    ) -> Result<Option<(Arc<FinalizedBlock>, rdchain_tx::TxBlock)>, StorageError> {
        if let Some(hit) = self.window.read().iter().find_map(|b| {
            b.txs
                .iter()
                .find(|tx| tx.hash() == *tx_hash)
                .map(|tx| (b.clone(), tx.clone()))
        }) {
            return Ok(Some(hit));
        }

        let owning_block_hash = {
            let r = self.db.begin_read()?;
            let idx = r.open_table(TX_TO_BLOCKS)?;
            let found = match idx.get(tx_hash.as_bytes())? {
                Some(hash_bytes) => Some(Hash::from_bytes(*hash_bytes.value())),
                None => None,
            };
            drop(idx);
            drop(r);
            let Some(found) = found else {
                return Ok(None);
            };
            found
        };

        let Some(block) = self.get_block_by_hash(&owning_block_hash)? else {
            return Ok(None);
        };
        let tx = block.txs.iter().find(|tx| tx.hash() == *tx_hash).cloned();
        Ok(tx.map(|tx| (block, tx)))
    }

    pub fn validators(&self) -> Result<Vec<Address>, StorageError> {
        let r = self.db.begin_read()?;
        let table = r.open_table(VALIDATORS)?;
        let mut out = Vec::new();
        for entry in table.iter()? {
            let (_, v) = entry?;
            out.push(Address::from_bytes(*v.value()));
        }
        Ok(out)
    }

    pub fn set_validators(&self, validators: &[Address]) -> Result<(), StorageError> {
        let w = self.db.begin_write()?;
        {
            let mut table = w.open_table(VALIDATORS)?;
            let mut existing_keys = Vec::new();
            for entry in table.iter()? {
                let (k, _) = entry?;
                existing_keys.push(*k.value());
            }
            for key in existing_keys {
                table.remove(&key)?;
            }
            for (i, addr) in validators.iter().enumerate() {
                let idx = u32::try_from(i)
                    .map_err(|_| StorageError::Invariant("validator set too large".into()))?;
                table.insert(&validator_index_key(idx), addr.as_bytes())?;
            }
        }
        w.commit()?;
        Ok(())
    }

    pub fn get_native_account_raw(&self, addr: &Address) -> Result<Option<Vec<u8>>, StorageError> {
        let r = self.db.begin_read()?;
        let table = r.open_table(NATIVE_ACCOUNTS)?;
        let out = table.get(addr.as_bytes())?.map(|v| v.value().to_vec());
        Ok(out)
    }

    pub fn put_native_account_raw(&self, addr: &Address, bytes: &[u8]) -> Result<(), StorageError> {
        let w = self.db.begin_write()?;
        {
            let mut table = w.open_table(NATIVE_ACCOUNTS)?;
            table.insert(addr.as_bytes(), bytes)?;
        }
        w.commit()?;
        Ok(())
    }

    /// Drains any queued writes and joins the background persistence thread.
    /// Consumes `self`.
    pub fn shutdown(self) {
        let ChainStore {
            tx_sender, flusher, ..
        } = self;
        drop(tx_sender);
        if let Some(handle) = flusher {
            let _ = handle.join();
        }
    }
}

fn persist_block(
    db: &Database,
    height: u64,
    hash: [u8; 32],
    db_bytes: &[u8],
    tx_hashes: &[[u8; 32]],
) -> Result<(), StorageError> {
    let w = db.begin_write()?;
    {
        let mut blocks = w.open_table(BLOCKS)?;
        blocks.insert(&hash, db_bytes)?;

        let mut heights = w.open_table(BLOCK_HEIGHT_MAPS)?;
        heights.insert(&height_key(height), &hash)?;

        let mut tx_index = w.open_table(TX_TO_BLOCKS)?;
        for tx_hash in tx_hashes {
            tx_index.insert(tx_hash, &hash)?;
        }

        let mut meta = w.open_table(META)?;
        meta.insert(LATEST_KEY, hash.as_slice())?;
    }
    w.commit()?;
    Ok(())
}

/// Loads up to `window_capacity` of the most recent blocks (walking back
/// from `"latest"` via `prev_hash`) into `window`, oldest first.
fn load_hot_window(
    db: &Database,
    chain_id: u64,
    window_capacity: usize,
    window: &mut VecDeque<Arc<FinalizedBlock>>,
) -> Result<(), StorageError> {
    let r = db.begin_read()?;
    let meta = r.open_table(META)?;
    let Some(latest) = meta.get(LATEST_KEY)? else {
        return Ok(());
    };
    let mut hash = [0u8; 32];
    hash.copy_from_slice(latest.value());

    let blocks = r.open_table(BLOCKS)?;
    let mut loaded = VecDeque::new();
    let mut cursor = Some(hash);
    while let Some(h) = cursor {
        if loaded.len() >= window_capacity {
            break;
        }
        let Some(bytes) = blocks.get(&h)? else {
            break;
        };
        let block = FinalizedBlock::deserialize_db(bytes.value(), chain_id)?;
        let prev = *block.header.prev_hash.as_bytes();
        let is_genesis = block.header.n_height == 0;
        loaded.push_front(Arc::new(block));
        cursor = if is_genesis { None } else { Some(prev) };
    }
    *window = loaded;
    Ok(())
}
