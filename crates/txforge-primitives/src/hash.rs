//! SHA-256 hash functions.
//!
//! Double SHA-256 (`sha256d`) is the Bitcoin hash function behind
//! transaction IDs, merkle trees, and Base58Check checksums.

use sha2::{Digest, Sha256};

/// Compute SHA-256 of the input data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute double SHA-256 (SHA-256 applied twice) of the input data.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}
