//! Merkle path (BUMP) type and verification.
//!
//! A merkle path proves a transaction's inclusion in a block. The binary
//! layout follows the BUMP format: a varint block height, a tree height
//! byte, then per level a varint leaf count and `offset || flags || [hash]`
//! leaves, where flag bit 0 marks a duplicated sibling (odd leaf count)
//! and flag bit 1 marks the proven transaction ID itself.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use txforge_primitives::chainhash::Hash;
use txforge_primitives::codec::{Reader, VarInt, Writer};

use crate::chain_tracker::ChainTracker;
use crate::error::SpvError;
use crate::merkle_tree_parent::merkle_tree_parent;

/// A single leaf within one level of a merkle path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathElement {
    /// Position of this leaf within its tree level.
    pub offset: u64,
    /// Hash at this position; absent when `duplicate` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<Hash>,
    /// `Some(true)` when this leaf is a proven transaction ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txid: Option<bool>,
    /// `Some(true)` when the sibling duplicates its pair (odd leaf count).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
}

/// A merkle path (BUMP) binding transactions to a block.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerklePath {
    /// Height of the block the path's root belongs to.
    pub block_height: u32,
    /// Tree levels from the leaves (index 0) up to just below the root.
    pub path: Vec<Vec<PathElement>>,
}

impl MerklePath {
    /// Create a merkle path from pre-built levels.
    pub fn new(block_height: u32, path: Vec<Vec<PathElement>>) -> Self {
        MerklePath { block_height, path }
    }

    // -----------------------------------------------------------------
    // Binary format
    // -----------------------------------------------------------------

    /// Parse a merkle path from hex.
    pub fn from_hex(hex_str: &str) -> Result<Self, SpvError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Parse a merkle path from its binary encoding.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SpvError> {
        if data.len() < 37 {
            return Err(SpvError::InvalidMerklePath(
                "too short to contain a block height and one hash".to_string(),
            ));
        }
        let mut reader = Reader::new(data);
        Self::from_reader(&mut reader)
    }

    /// Parse a merkle path from a reader positioned at its first byte.
    pub fn from_reader(reader: &mut Reader) -> Result<Self, SpvError> {
        let block_height = reader
            .read_varint()
            .map_err(|e| SpvError::InvalidMerklePath(format!("reading block height: {}", e)))?
            .value() as u32;

        let tree_height = reader
            .read_u8()
            .map_err(|e| SpvError::InvalidMerklePath(format!("reading tree height: {}", e)))?;

        let mut path = Vec::with_capacity(tree_height as usize);
        for level_idx in 0..tree_height {
            let n_leaves = reader.read_varint().map_err(|e| {
                SpvError::InvalidMerklePath(format!(
                    "reading leaf count at level {}: {}",
                    level_idx, e
                ))
            })?;

            let mut level = Vec::with_capacity(n_leaves.value() as usize);
            for _ in 0..n_leaves.value() {
                let offset = reader
                    .read_varint()
                    .map_err(|e| SpvError::InvalidMerklePath(format!("reading offset: {}", e)))?
                    .value();
                let flags = reader
                    .read_u8()
                    .map_err(|e| SpvError::InvalidMerklePath(format!("reading flags: {}", e)))?;

                let duplicate = (flags & 1) != 0;
                let hash = if duplicate {
                    None
                } else {
                    let bytes = reader.read_bytes(32).map_err(|e| {
                        SpvError::InvalidMerklePath(format!("reading hash: {}", e))
                    })?;
                    Some(Hash::from_bytes(bytes)?)
                };

                level.push(PathElement {
                    offset,
                    hash,
                    txid: if (flags & 2) != 0 { Some(true) } else { None },
                    duplicate: if duplicate { Some(true) } else { None },
                });
            }

            level.sort_by_key(|leaf| leaf.offset);
            path.push(level);
        }

        Ok(MerklePath { block_height, path })
    }

    /// Serialize this merkle path to its binary encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write_varint(VarInt(self.block_height as u64));
        writer.write_u8(self.path.len() as u8);

        for level in &self.path {
            writer.write_varint(VarInt::from(level.len()));
            for leaf in level {
                writer.write_varint(VarInt(leaf.offset));
                let mut flags = 0u8;
                if leaf.duplicate == Some(true) {
                    flags |= 1;
                }
                if leaf.txid == Some(true) {
                    flags |= 2;
                }
                writer.write_u8(flags);
                if flags & 1 == 0 {
                    if let Some(ref hash) = leaf.hash {
                        writer.write_bytes(hash.as_bytes());
                    }
                }
            }
        }

        writer.into_bytes()
    }

    /// Serialize this merkle path to hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    // -----------------------------------------------------------------
    // Root computation
    // -----------------------------------------------------------------

    /// Compute the merkle root proven by this path for `txid`.
    ///
    /// With `None`, the first hash present at level 0 is used as the
    /// starting transaction ID. Fails when the txid is not a level-0 leaf
    /// or a required sibling cannot be found or derived.
    pub fn compute_root(&self, txid: Option<&Hash>) -> Result<Hash, SpvError> {
        if self.path.is_empty() {
            return Err(SpvError::InvalidMerklePath("path has no levels".to_string()));
        }

        let txid = match txid {
            Some(t) => *t,
            None => self.path[0]
                .iter()
                .find_map(|leaf| leaf.hash)
                .ok_or_else(|| {
                    SpvError::InvalidMerklePath("no hash present at level 0".to_string())
                })?,
        };

        // A single-leaf, single-level path proves a one-transaction block.
        if self.path.len() == 1 && self.path[0].len() == 1 {
            return Ok(txid);
        }

        let start = self.path[0]
            .iter()
            .find(|leaf| leaf.hash == Some(txid))
            .ok_or_else(|| {
                SpvError::InvalidMerklePath(format!("path does not contain txid {}", txid))
            })?;
        let index = start.offset;

        let levels = self.index_levels();
        let mut working = txid;
        for height in 0..self.path.len() {
            let sibling_offset = (index >> height) ^ 1;
            let sibling = Self::leaf_at(&levels, height, sibling_offset).ok_or_else(|| {
                SpvError::InvalidMerklePath(format!(
                    "no hash for offset {} at height {}",
                    sibling_offset, height
                ))
            })?;

            working = if sibling.duplicate == Some(true) {
                merkle_tree_parent(&working, &working)
            } else {
                let sibling_hash = sibling.hash.ok_or_else(|| {
                    SpvError::InvalidMerklePath(format!(
                        "missing hash at height {} offset {}",
                        height, sibling_offset
                    ))
                })?;
                if sibling_offset % 2 != 0 {
                    merkle_tree_parent(&working, &sibling_hash)
                } else {
                    merkle_tree_parent(&sibling_hash, &working)
                }
            };
        }

        Ok(working)
    }

    /// Index every level by offset for sibling lookups.
    fn index_levels(&self) -> Vec<HashMap<u64, PathElement>> {
        self.path
            .iter()
            .map(|level| {
                level
                    .iter()
                    .map(|leaf| (leaf.offset, leaf.clone()))
                    .collect()
            })
            .collect()
    }

    /// Find the leaf at `offset` in `layer`, deriving interior nodes from
    /// their children when they are not stored explicitly.
    fn leaf_at(
        levels: &[HashMap<u64, PathElement>],
        layer: usize,
        offset: u64,
    ) -> Option<PathElement> {
        if let Some(leaf) = levels[layer].get(&offset) {
            return Some(leaf.clone());
        }
        if layer == 0 {
            return None;
        }

        let left = Self::leaf_at(levels, layer - 1, offset * 2)?;
        let right = Self::leaf_at(levels, layer - 1, offset * 2 + 1)?;
        let left_hash = left.hash?;
        let derived = if right.duplicate == Some(true) {
            merkle_tree_parent(&left_hash, &left_hash)
        } else {
            merkle_tree_parent(&left_hash, &right.hash?)
        };
        Some(PathElement {
            offset,
            hash: Some(derived),
            txid: None,
            duplicate: None,
        })
    }

    // -----------------------------------------------------------------
    // Combining and verification
    // -----------------------------------------------------------------

    /// Merge another path into this one.
    ///
    /// Both paths must prove the same root at the same block height. After
    /// combining, this path can prove every txid either side could, with
    /// interior nodes trimmed wherever both children are present.
    pub fn combine(&mut self, other: &MerklePath) -> Result<(), SpvError> {
        if self.block_height != other.block_height {
            return Err(SpvError::InvalidMerklePath(
                "cannot combine paths from different block heights".to_string(),
            ));
        }
        if self.compute_root(None)? != other.compute_root(None)? {
            return Err(SpvError::InvalidMerklePath(
                "cannot combine paths with different roots".to_string(),
            ));
        }

        let height = self.path.len().max(other.path.len());
        let mut merged: Vec<BTreeMap<u64, PathElement>> = vec![BTreeMap::new(); height];
        for side in [&self.path, &other.path] {
            for (h, level) in side.iter().enumerate() {
                for leaf in level {
                    merged[h].insert(leaf.offset, leaf.clone());
                }
            }
        }

        // Interior nodes whose children both survive are redundant.
        let mut path = Vec::with_capacity(height);
        for h in 0..height {
            let level: Vec<PathElement> = merged[h]
                .values()
                .filter(|leaf| {
                    if h == 0 {
                        return true;
                    }
                    let child = leaf.offset * 2;
                    !(merged[h - 1].contains_key(&child)
                        && merged[h - 1].contains_key(&(child + 1)))
                })
                .cloned()
                .collect();
            path.push(level);
        }

        self.path = path;
        Ok(())
    }

    /// Verify that this path anchors `txid` in a block known to `tracker`.
    pub fn verify(&self, txid: &Hash, tracker: &dyn ChainTracker) -> Result<bool, SpvError> {
        let root = self.compute_root(Some(txid))?;
        tracker.is_valid_root_for_height(&root, self.block_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUMP_HEX: &str = "fe8a6a0c000c04fde80b0011774f01d26412f0d16ea3f0447be0b5ebec67b0782e321a7a01cbdf7f734e30fde90b02004e53753e3fe4667073063a17987292cfdea278824e9888e52180581d7188d8fdea0b025e441996fc53f0191d649e68a200e752fb5f39e0d5617083408fa179ddc5c998fdeb0b0102fdf405000671394f72237d08a4277f4435e5b6edf7adc272f25effef27cdfe805ce71a81fdf50500262bccabec6c4af3ed00cc7a7414edea9c5efa92fb8623dd6160a001450a528201fdfb020101fd7c010093b3efca9b77ddec914f8effac691ecb54e2c81d0ab81cbc4c4b93befe418e8501bf01015e005881826eb6973c54003a02118fe270f03d46d02681c8bc71cd44c613e86302f8012e00e07a2bb8bb75e5accff266022e1e5e6e7b4d6d943a04faadcf2ab4a22f796ff30116008120cafa17309c0bb0e0ffce835286b3a2dcae48e4497ae2d2b7ced4f051507d010a00502e59ac92f46543c23006bff855d96f5e648043f0fb87a7a5949e6a9bebae430104001ccd9f8f64f4d0489b30cc815351cf425e0e78ad79a589350e4341ac165dbe45010301010000af8764ce7e1cc132ab5ed2229a005c87201c9a5ee15c0f91dd53eff31ab30cd4";
    const BUMP_ROOT: &str = "57aab6e6fb1b697174ffb64e062c4728f2ffd33ddcfa02a43b64d8cd29b483b4";
    const BUMP_TXID1: &str = "304e737fdfcb017a1a322e78b067ecebb5e07b44f0a36ed1f01264d2014f7711";
    const BUMP_TXID2: &str = "d888711d588021e588984e8278a2decf927298173a06737066e43f3e75534e00";
    const BUMP_TXID3: &str = "98c9c5dd79a18f40837061d5e0395ffb52e700a2689e641d19f053fc9619445e";

    fn root_for(path: &MerklePath, txid: &str) -> Result<String, SpvError> {
        let txid = Hash::from_hex(txid).unwrap();
        Ok(path.compute_root(Some(&txid))?.to_string())
    }

    #[test]
    fn test_binary_roundtrip() {
        let path = MerklePath::from_hex(BUMP_HEX).unwrap();
        assert_eq!(path.to_hex(), BUMP_HEX);
        assert_eq!(path.block_height, 813706);
    }

    #[test]
    fn test_compute_root_for_each_proven_txid() {
        let path = MerklePath::from_hex(BUMP_HEX).unwrap();
        for txid in [BUMP_TXID1, BUMP_TXID2, BUMP_TXID3] {
            assert_eq!(root_for(&path, txid).unwrap(), BUMP_ROOT);
        }
    }

    #[test]
    fn test_compute_root_rejects_foreign_txid() {
        let path = MerklePath::from_hex(BUMP_HEX).unwrap();
        let missing =
            Hash::from_hex("00000000000000000000000000000000000000000000000000000000000000ff")
                .unwrap();
        assert!(path.compute_root(Some(&missing)).is_err());
    }

    #[test]
    fn test_single_leaf_block() {
        let txid =
            Hash::from_hex("0000000000000000000000000000000000000000000000000000000000000042")
                .unwrap();
        let path = MerklePath::new(
            500,
            vec![vec![PathElement {
                offset: 0,
                hash: Some(txid),
                txid: Some(true),
                duplicate: None,
            }]],
        );
        assert_eq!(path.compute_root(Some(&txid)).unwrap(), txid);
    }

    #[test]
    fn test_rejects_truncated_bytes() {
        assert!(MerklePath::from_bytes(&[0x01, 0x02]).is_err());
        let bytes = hex::decode(BUMP_HEX).unwrap();
        assert!(MerklePath::from_bytes(&bytes[..bytes.len() - 8]).is_err());
    }

    #[test]
    fn test_combine_partial_paths() {
        let full = MerklePath::from_hex(BUMP_HEX).unwrap();

        // Split level 0 and 1 so each side can only prove part of the set.
        let mut level0_a = full.path[0][..2].to_vec();
        level0_a.extend_from_slice(&full.path[0][4..]);
        let level0_b = full.path[0][2..].to_vec();
        let level1_a = full.path[1][1..].to_vec();
        let level1_b = full.path[1][..full.path[1].len() - 1].to_vec();

        let mut levels_a = vec![level0_a, level1_a];
        levels_a.extend_from_slice(&full.path[2..]);
        let mut side_a = MerklePath::new(full.block_height, levels_a);

        let mut levels_b = vec![level0_b, level1_b];
        levels_b.extend_from_slice(&full.path[2..]);
        let side_b = MerklePath::new(full.block_height, levels_b);

        assert_eq!(root_for(&side_a, BUMP_TXID2).unwrap(), BUMP_ROOT);
        assert!(root_for(&side_a, BUMP_TXID3).is_err());
        assert_eq!(root_for(&side_b, BUMP_TXID3).unwrap(), BUMP_ROOT);
        assert!(root_for(&side_b, BUMP_TXID2).is_err());

        side_a.combine(&side_b).unwrap();
        assert_eq!(root_for(&side_a, BUMP_TXID2).unwrap(), BUMP_ROOT);
        assert_eq!(root_for(&side_a, BUMP_TXID3).unwrap(), BUMP_ROOT);
    }

    #[test]
    fn test_combine_rejects_mismatched_heights() {
        let mut a = MerklePath::from_hex(BUMP_HEX).unwrap();
        let mut b = a.clone();
        b.block_height += 1;
        assert!(a.combine(&b).is_err());
    }

    #[test]
    fn test_verify_consults_tracker() {
        struct FixedRoot(String);
        impl ChainTracker for FixedRoot {
            fn is_valid_root_for_height(
                &self,
                root: &Hash,
                height: u32,
            ) -> Result<bool, SpvError> {
                Ok(height == 813706 && root.to_string() == self.0)
            }
        }

        let path = MerklePath::from_hex(BUMP_HEX).unwrap();
        let txid = Hash::from_hex(BUMP_TXID1).unwrap();
        assert!(path.verify(&txid, &FixedRoot(BUMP_ROOT.to_string())).unwrap());
        assert!(!path
            .verify(&txid, &FixedRoot("00".repeat(32)))
            .unwrap());
    }

    #[test]
    fn test_serde_camel_case() {
        let path = MerklePath::from_hex(BUMP_HEX).unwrap();
        let json = serde_json::to_value(&path).unwrap();
        assert!(json.get("blockHeight").is_some());
        let back: MerklePath = serde_json::from_value(json).unwrap();
        assert_eq!(back.to_hex(), BUMP_HEX);
    }
}
