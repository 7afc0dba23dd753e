//! Script templates.
//!
//! An unlocking template is the seam through which signing strategies
//! (P2PKH with a private key, multisig, custom covenants) plug into
//! [`Transaction::sign`](crate::Transaction::sign). The engine itself only
//! ships the P2PKH *locking* side; producing signatures requires an ECDSA
//! implementation supplied by the caller.

pub mod p2pkh;

use txforge_script::Script;

use crate::transaction::Transaction;
use crate::TransactionError;

/// Capability that produces unlocking scripts for transaction inputs.
pub trait UnlockingScriptTemplate {
    /// Produce the unlocking script for `input_index` of `tx`.
    ///
    /// Called with the complete transaction so implementations can compute
    /// signature hashes over any subset of it.
    fn sign(&self, tx: &Transaction, input_index: usize) -> Result<Script, TransactionError>;

    /// Estimate the byte length of the unlocking script this template will
    /// produce. Consulted by fee models before signatures exist.
    fn estimate_length(&self, tx: &Transaction, input_index: usize) -> u64;
}
