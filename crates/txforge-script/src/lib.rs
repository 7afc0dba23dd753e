#![deny(missing_docs)]

//! txforge SDK - scripts and addresses.
//!
//! Provides the `Script` byte-sequence newtype used for locking and
//! unlocking scripts, the opcode constants the SDK emits, and Base58Check
//! P2PKH address handling. Script *evaluation* is not part of this crate;
//! the transaction layer delegates it to an external interpreter through
//! its `SpendValidator` seam.

/// The Script newtype.
pub mod script;
/// Opcode constants.
pub mod opcodes;
/// Base58Check P2PKH addresses.
pub mod address;

mod error;
pub use address::{Address, Network};
pub use error::ScriptError;
pub use script::Script;
