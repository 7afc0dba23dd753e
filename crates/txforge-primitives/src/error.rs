/// Error types for primitive operations.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    /// A read ran past the end of the input buffer.
    #[error("unexpected end of data")]
    UnexpectedEof,
    /// A hash value had the wrong length or content.
    #[error("invalid hash: {0}")]
    InvalidHash(String),
    /// Hex decoding error.
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),
}
