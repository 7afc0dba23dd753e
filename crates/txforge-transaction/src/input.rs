//! Transaction input referencing a previous output.
//!
//! An input names the output it spends by `source_txid` and
//! `source_output_index`, and may carry a back-reference to the full
//! source transaction. Back-references are `Arc`-shared: several children
//! can point at the same parent, which is how the ancestor DAG behind BEEF
//! serialization and SPV verification is formed.

use std::fmt;
use std::sync::Arc;

use txforge_primitives::chainhash::Hash;
use txforge_primitives::codec::{Reader, VarInt, Writer};
use txforge_script::Script;

use crate::output::TransactionOutput;
use crate::template::UnlockingScriptTemplate;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Default sequence number marking a finalized input.
pub const DEFAULT_SEQUENCE: u32 = 0xFFFF_FFFF;

/// A single transaction input.
///
/// # Wire format
///
/// | Field               | Size            |
/// |---------------------|-----------------|
/// | source_txid         | 32 bytes        |
/// | source_output_index | 4 bytes (LE)    |
/// | script length       | VarInt          |
/// | unlocking_script    | variable        |
/// | sequence            | 4 bytes (LE)    |
///
/// The txid appears on the wire in internal byte order, i.e. reversed
/// relative to its hex rendering.
#[derive(Clone)]
pub struct TransactionInput {
    /// TXID of the transaction whose output is being spent.
    pub source_txid: Hash,

    /// Index of the spent output within the source transaction.
    pub source_output_index: u32,

    /// Sequence number; defaults to `0xFFFFFFFF`.
    pub sequence: u32,

    /// The unlocking script. `None` until the input is signed.
    pub unlocking_script: Option<Script>,

    /// Back-reference to the full source transaction, when known.
    pub source_transaction: Option<Arc<Transaction>>,

    /// Template invoked by [`Transaction::sign`] to produce the unlocking
    /// script.
    pub unlocking_script_template: Option<Arc<dyn UnlockingScriptTemplate>>,
}

impl TransactionInput {
    /// Create an input with default values and no source information.
    pub fn new() -> Self {
        TransactionInput {
            source_txid: Hash::default(),
            source_output_index: 0,
            sequence: DEFAULT_SEQUENCE,
            unlocking_script: None,
            source_transaction: None,
            unlocking_script_template: None,
        }
    }

    /// Deserialize an input from a reader in the standard wire format.
    pub fn read_from(reader: &mut Reader) -> Result<Self, TransactionError> {
        let txid_bytes = reader.read_bytes(32).map_err(|e| {
            TransactionError::Serialization(format!("reading source txid: {}", e))
        })?;
        let source_txid = Hash::from_bytes(txid_bytes)?;

        let source_output_index = reader.read_u32_le().map_err(|e| {
            TransactionError::Serialization(format!("reading output index: {}", e))
        })?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::Serialization(format!("reading script length: {}", e))
        })?;
        let script_bytes = reader.read_bytes(script_len.value() as usize).map_err(|e| {
            TransactionError::Serialization(format!("reading unlocking script: {}", e))
        })?;

        let sequence = reader.read_u32_le().map_err(|e| {
            TransactionError::Serialization(format!("reading sequence: {}", e))
        })?;

        Ok(TransactionInput {
            source_txid,
            source_output_index,
            sequence,
            unlocking_script: Some(Script::from_bytes(script_bytes)),
            source_transaction: None,
            unlocking_script_template: None,
        })
    }

    /// Serialize this input into a writer.
    ///
    /// `index` is this input's position within its transaction, used only
    /// for error reporting.
    pub(crate) fn write_to(
        &self,
        writer: &mut Writer,
        index: usize,
    ) -> Result<(), TransactionError> {
        writer.write_bytes(self.source_txid.as_bytes());
        writer.write_u32_le(self.source_output_index);

        let script = self
            .unlocking_script
            .as_ref()
            .ok_or(TransactionError::MissingUnlockingScript(index))?;
        writer.write_varint(VarInt::from(script.len()));
        writer.write_bytes(script.to_bytes());

        writer.write_u32_le(self.sequence);
        Ok(())
    }

    /// Look up the output this input spends, through `source_transaction`.
    pub fn source_output(&self) -> Option<&TransactionOutput> {
        self.source_transaction
            .as_ref()?
            .outputs
            .get(self.source_output_index as usize)
    }

    /// Satoshi value of the spent output, when resolvable.
    pub fn source_satoshis(&self) -> Option<u64> {
        self.source_output()?.satoshis
    }

    /// Locking script of the spent output, when resolvable.
    pub fn source_locking_script(&self) -> Option<&Script> {
        self.source_output().map(|output| &output.locking_script)
    }
}

impl Default for TransactionInput {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransactionInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionInput")
            .field("source_txid", &self.source_txid.to_string())
            .field("source_output_index", &self.source_output_index)
            .field("sequence", &self.sequence)
            .field("unlocking_script", &self.unlocking_script)
            .field("source_transaction", &self.source_transaction.is_some())
            .field("template", &self.unlocking_script_template.is_some())
            .finish()
    }
}
