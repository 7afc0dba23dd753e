//! Chain tracker trait for SPV verification.

use txforge_primitives::chainhash::Hash;

use crate::error::SpvError;

/// Oracle over block headers.
///
/// Implementors answer whether a computed merkle root is the root recorded
/// in the header at a given height. The transaction verifier treats the
/// *absence* of a tracker as "scripts only" mode, accepting merkle anchors
/// without consulting headers.
pub trait ChainTracker {
    /// Check whether `root` is the merkle root of the block at `height`.
    fn is_valid_root_for_height(&self, root: &Hash, height: u32) -> Result<bool, SpvError>;
}
