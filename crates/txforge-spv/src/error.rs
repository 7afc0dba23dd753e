/// Error types for SPV operations.
#[derive(Debug, thiserror::Error)]
pub enum SpvError {
    /// Invalid merkle path / BUMP (malformed bytes, missing hashes, or
    /// structurally impossible path).
    #[error("invalid merkle path: {0}")]
    InvalidMerklePath(String),
    /// The chain tracker could not answer a header query.
    #[error("chain tracker error: {0}")]
    ChainTracker(String),
    /// Error propagated from the primitives layer.
    #[error("primitives error: {0}")]
    Primitives(#[from] txforge_primitives::PrimitivesError),
    /// Hex decoding error.
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),
}
