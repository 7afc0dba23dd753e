/// Error types for script and address operations.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Invalid hex string.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Invalid address string (bad characters or undecodable).
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Address decoded to the wrong payload length.
    #[error("invalid address length for '{0}'")]
    InvalidAddressLength(String),

    /// Address version byte is not a supported P2PKH prefix.
    #[error("address not supported: {0}")]
    UnsupportedAddress(String),

    /// Base58Check checksum does not match.
    #[error("checksum failed")]
    ChecksumFailed,
}
