//! Merkle parent hash computation.

use txforge_primitives::chainhash::Hash;
use txforge_primitives::hash::sha256d;

/// Compute the merkle parent of two child hashes.
///
/// Both hashes are in internal (little-endian) byte order; they are
/// concatenated directly and double-SHA256'd.
pub fn merkle_tree_parent(left: &Hash, right: &Hash) -> Hash {
    let mut concatenated = [0u8; 64];
    concatenated[..32].copy_from_slice(left.as_bytes());
    concatenated[32..].copy_from_slice(right.as_bytes());
    Hash::new(sha256d(&concatenated))
}
