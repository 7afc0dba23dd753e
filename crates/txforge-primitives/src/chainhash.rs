//! 32-byte chain hash used for transaction IDs and merkle roots.
//!
//! The bytes are stored in internal (little-endian) order and displayed as
//! byte-reversed hex, following Bitcoin's convention for TXIDs and block
//! hashes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hash::sha256d;
use crate::PrimitivesError;

/// Size of a chain hash in bytes.
pub const HASH_SIZE: usize = 32;

/// A 32-byte hash in internal (little-endian) byte order.
///
/// Rendering with `Display` or `to_string` reverses the bytes, producing
/// the big-endian hex form in which TXIDs are conventionally written.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Wrap a raw 32-byte array (internal byte order, stored as-is).
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Create a hash from a byte slice in internal order.
    ///
    /// # Returns
    /// `Ok(Hash)` if the slice is exactly 32 bytes, otherwise
    /// `PrimitivesError::InvalidHash`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let arr: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| {
            PrimitivesError::InvalidHash(format!(
                "invalid hash length of {}, want {}",
                bytes.len(),
                HASH_SIZE
            ))
        })?;
        Ok(Hash(arr))
    }

    /// Parse a hash from its display-order (byte-reversed) hex rendering.
    ///
    /// Short strings are treated as having stripped leading zeros and are
    /// padded on the high end, matching the common handling of block
    /// hashes.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.len() > HASH_SIZE * 2 {
            return Err(PrimitivesError::InvalidHash(format!(
                "hex string of {} chars exceeds {} bytes",
                hex_str.len(),
                HASH_SIZE
            )));
        }

        let padded = if hex_str.len() % 2 != 0 {
            format!("0{}", hex_str)
        } else {
            hex_str.to_string()
        };
        let decoded = hex::decode(&padded)?;

        // Right-align in display order, then flip into internal order.
        let mut internal = [0u8; HASH_SIZE];
        for (i, byte) in decoded.iter().rev().enumerate() {
            internal[i] = *byte;
        }
        Ok(Hash(internal))
    }

    /// Borrow the internal 32-byte array.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "{}", hex::encode(reversed))
    }
}

impl FromStr for Hash {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Compute double SHA-256 of the input and wrap the digest as a `Hash`.
pub fn double_hash(data: &[u8]) -> Hash {
    Hash(sha256d(data))
}
