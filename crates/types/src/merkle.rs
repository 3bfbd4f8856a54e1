//! Pairwise-keccak256 merkle tree over a list of leaf hashes, with odd
//! leaves carried up unchanged to the next layer.

use crate::hash::Hash;

/// A full merkle tree, layers stored bottom-up (`layers[0]` is the leaves).
#[derive(Debug, Clone)]
pub struct MerkleTree {
    layers: Vec<Vec<Hash>>,
}

fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let digest = rdchain_crypto::keccak256_concat(&[left.as_bytes(), right.as_bytes()]);
    Hash::from_bytes(digest)
}

fn next_layer(layer: &[Hash]) -> Vec<Hash> {
    let mut out = Vec::with_capacity(layer.len().div_ceil(2));
    let mut i = 0;
    while i < layer.len() {
        if i + 1 < layer.len() {
            out.push(hash_pair(&layer[i], &layer[i + 1]));
        } else {
            out.push(layer[i]);
        }
        i += 2;
    }
    out
}

impl MerkleTree {
    /// Builds a tree over `leaves`. An empty input yields a zero root.
    pub fn build(leaves: &[Hash]) -> Self {
        if leaves.is_empty() {
            return MerkleTree {
                layers: vec![vec![Hash::zero()]],
            };
        }
        let mut layers = vec![leaves.to_vec()];
        while layers.last().map(|l| l.len()).unwrap_or(0) > 1 {
            let layer = next_layer(layers.last().expect("layers is never empty"));
            layers.push(layer);
        }
        MerkleTree { layers }
    }

    pub fn root(&self) -> Hash {
        self.layers
            .last()
            .and_then(|l| l.first())
            .copied()
            .unwrap_or_else(Hash::zero)
    }

    /// Returns the sibling path from `leaf_index` up to (but excluding) the
    /// root, one entry per layer. `None` means the node at that layer had no
    /// sibling and was carried up to the next layer unhashed.
    pub fn proof(&self, leaf_index: usize) -> Vec<Option<Hash>> {
        let mut proof = Vec::new();
        let mut index = leaf_index;
        for layer in &self.layers[..self.layers.len().saturating_sub(1)] {
            let sibling_index = if index % 2 == 0 { index + 1 } else { index - 1 };
            proof.push(layer.get(sibling_index).copied());
            index /= 2;
        }
        proof
    }
}

/// Recomputes a root from `leaf`, its `proof`, and its original index, and
/// compares it against `root`.
pub fn verify_proof(leaf: Hash, leaf_index: usize, proof: &[Option<Hash>], root: Hash) -> bool {
    let mut current = leaf;
    let mut index = leaf_index;
    for step in proof {
        current = match step {
            Some(sibling) if index % 2 == 0 => hash_pair(&current, sibling),
            Some(sibling) => hash_pair(sibling, &current),
            None => current,
        };
        index /= 2;
    }
    current == root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<Hash> {
        (0..n)
            .map(|i| Hash::from_bytes(rdchain_crypto::keccak256(&(i as u64).to_be_bytes())))
            .collect()
    }

    #[test]
    fn empty_tree_has_zero_root() {
        let tree = MerkleTree::build(&[]);
        assert!(tree.root().is_zero());
    }

    #[test]
    fn single_leaf_is_its_own_root() {
        let leaf = Hash::random();
        let tree = MerkleTree::build(&[leaf]);
        assert_eq!(tree.root(), leaf);
    }

    #[test]
    fn proof_verifies_for_every_leaf_and_rejects_other_leaves() {
        for n in [1, 2, 3, 4, 5, 7, 16] {
            let ls = leaves(n);
            let tree = MerkleTree::build(&ls);
            let root = tree.root();
            for i in 0..n {
                let proof = tree.proof(i);
                assert!(
                    verify_proof(ls[i], i, &proof, root),
                    "leaf {i} of {n} should verify"
                );
                for j in 0..n {
                    if j != i {
                        assert!(
                            !verify_proof(ls[j], i, &proof, root),
                            "leaf {j} must not verify against leaf {i}'s proof"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn determinism_across_rebuilds() {
        let ls = leaves(9);
        let t1 = MerkleTree::build(&ls);
        let t2 = MerkleTree::build(&ls);
        assert_eq!(t1.root(), t2.root());
    }
}
