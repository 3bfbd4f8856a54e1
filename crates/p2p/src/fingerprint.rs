//! Broadcast fingerprinting and dedup.

use fnv::FnvHasher;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::hash::Hasher;

pub fn fnv1a_64(data: &[u8]) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(data);
    hasher.finish()
}

/// Tracks broadcast fingerprints already seen so a message is rebroadcast at
/// most once per node; anything already known is dropped silently.
#[derive(Default)]
pub struct BroadcastDedup {
    seen: Mutex<HashSet<u64>>,
}

impl BroadcastDedup {
    pub fn new() -> Self {
        BroadcastDedup::default()
    }

    /// Returns `true` if `fingerprint` is new (and is now recorded as seen).
    pub fn admit(&self, fingerprint: u64) -> bool {
        self.seen.lock().insert(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_is_deterministic() {
        assert_eq!(fnv1a_64(b"hello"), fnv1a_64(b"hello"));
        assert_ne!(fnv1a_64(b"hello"), fnv1a_64(b"world"));
    }

    #[test]
    fn dedup_admits_each_fingerprint_once() {
        let dedup = BroadcastDedup::new();
        assert!(dedup.admit(42));
        assert!(!dedup.admit(42));
        assert!(dedup.admit(43));
        assert_eq!(dedup.len(), 2);
    }
}
