//! The spend-evaluation contract.
//!
//! A [`Spend`] bundles everything Bitcoin script evaluation and signature
//! hashing need about one input: the output being consumed, the spending
//! transaction's shape, and the input's own position within it. The
//! verifier builds one per input and hands it to a [`SpendValidator`],
//! the seam behind which a full script interpreter lives.

use txforge_primitives::chainhash::Hash;
use txforge_script::Script;

use crate::input::TransactionInput;
use crate::output::TransactionOutput;
use crate::TransactionError;

/// The full evaluation context for one input spending one output.
#[derive(Clone, Debug)]
pub struct Spend {
    /// TXID of the transaction whose output is being spent.
    pub source_txid: Hash,
    /// Index of the spent output in the source transaction.
    pub source_output_index: u32,
    /// Satoshi value of the spent output.
    pub source_satoshis: u64,
    /// Locking script of the spent output.
    pub locking_script: Script,
    /// Version of the spending transaction.
    pub transaction_version: u32,
    /// Every input of the spending transaction except this one.
    pub other_inputs: Vec<TransactionInput>,
    /// Outputs of the spending transaction.
    pub outputs: Vec<TransactionOutput>,
    /// The unlocking script under evaluation.
    pub unlocking_script: Script,
    /// Sequence number of the spending input.
    pub input_sequence: u32,
    /// Position of the spending input within its transaction.
    pub input_index: usize,
    /// Lock time of the spending transaction.
    pub lock_time: u32,
}

/// Capability that evaluates a [`Spend`] with a script interpreter.
pub trait SpendValidator {
    /// Evaluate the unlocking script against the locking script.
    ///
    /// Returns `Ok(false)` for a script that executes but does not
    /// authorize the spend; `Err` only for evaluation breakdowns.
    fn validate(&self, spend: &Spend) -> Result<bool, TransactionError>;
}
