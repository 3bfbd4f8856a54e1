//! Application hooks the P2P overlay calls into; keeps `rdchain-p2p` itself
//! ignorant of storage/state/consensus internals.

pub trait Handler: Send + Sync {
    /// Answer body for `Info`: `version(8) | epoch_micros(8) |
    /// latest_height(8) | latest_hash(32)`.
    fn info(&self) -> Vec<u8>;
    /// Answer body for `RequestNodes`: an encoded `NodeAddr` list.
    fn nodes(&self) -> Vec<u8>;
    /// Answer body for `RequestValidatorTxs`: length-prefixed `TxValidator`s.
    fn validator_txs(&self) -> Vec<u8>;

    fn on_broadcast_validator_tx(&self, body: &[u8]);
    fn on_broadcast_tx(&self, body: &[u8]);
    fn on_broadcast_block(&self, body: &[u8]);
}
