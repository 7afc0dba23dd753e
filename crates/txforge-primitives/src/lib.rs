#![deny(missing_docs)]

//! txforge SDK - serialization and hashing primitives.
//!
//! Provides the byte cursor types used by every wire format in the SDK
//! (`Reader`, `Writer`, `VarInt`), the SHA-256 hash functions, and the
//! 32-byte `Hash` type used for transaction IDs and merkle roots.

/// Cursor-based reader/writer and Bitcoin varint encoding.
pub mod codec;
/// SHA-256 and double SHA-256.
pub mod hash;
/// 32-byte chain hash with byte-reversed hex display.
pub mod chainhash;

mod error;
pub use error::PrimitivesError;
