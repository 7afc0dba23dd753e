#![deny(missing_docs)]

//! txforge SDK - SPV building blocks.
//!
//! Provides merkle paths in the BUMP binary format, merkle parent hashing,
//! and the chain-tracker trait through which computed roots are checked
//! against block headers. The transaction crate builds its recursive SPV
//! verifier and BEEF envelopes on top of these types.

/// Error types for SPV operations.
pub mod error;
/// Merkle parent hash computation.
pub mod merkle_tree_parent;
/// Merkle path (BUMP) type, parsing, root computation, and combining.
pub mod merkle_path;
/// Chain tracker trait for header lookups.
pub mod chain_tracker;

pub use chain_tracker::ChainTracker;
pub use error::SpvError;
pub use merkle_path::{MerklePath, PathElement};
pub use merkle_tree_parent::merkle_tree_parent;
