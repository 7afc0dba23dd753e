//! The transaction aggregate.
//!
//! A `Transaction` is built mutably (add inputs, add outputs, compute the
//! fee, sign) and then frozen by emission into one of the wire formats:
//! classic raw (this module), Extended Format (`ef`), or BEEF (`beef`).
//! The double-SHA256 identity of the raw encoding is memoized and
//! invalidated by every mutator.
//!
//! # Raw wire format
//!
//! | Field        | Size                 |
//! |--------------|----------------------|
//! | version      | 4 bytes (LE)         |
//! | input count  | VarInt               |
//! | inputs       | variable (per input) |
//! | output count | VarInt               |
//! | outputs      | variable (per output)|
//! | lock_time    | 4 bytes (LE)         |

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use txforge_primitives::chainhash::Hash;
use txforge_primitives::codec::{Reader, VarInt, Writer};
use txforge_script::Address;
use txforge_spv::MerklePath;

use crate::input::TransactionInput;
use crate::output::TransactionOutput;
use crate::template::p2pkh;
use crate::TransactionError;

/// A transaction: version, inputs, outputs, and lock time, plus the
/// non-serialized state that drives fee computation, signing, BEEF
/// emission, and SPV verification.
#[derive(Clone, Debug)]
pub struct Transaction {
    /// Transaction format version.
    pub version: u32,

    /// Ordered inputs.
    pub inputs: Vec<TransactionInput>,

    /// Ordered outputs.
    pub outputs: Vec<TransactionOutput>,

    /// Lock time (block height or Unix timestamp); 0 means immediately
    /// spendable.
    pub lock_time: u32,

    /// Free-form annotations. Never serialized and not part of the
    /// transaction's identity.
    pub metadata: HashMap<String, serde_json::Value>,

    /// Proof of inclusion in a block, when known. A transaction carrying
    /// a merkle path is a terminal node for BEEF emission and SPV
    /// recursion.
    pub merkle_path: Option<Arc<MerklePath>>,

    /// Memoized double-SHA256 of the raw encoding.
    pub(crate) cached_hash: OnceLock<[u8; 32]>,
}

impl Transaction {
    /// Create an empty transaction with version 1 and lock time 0.
    pub fn new() -> Self {
        Transaction {
            version: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            metadata: HashMap::new(),
            merkle_path: None,
            cached_hash: OnceLock::new(),
        }
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    /// Parse a transaction from hex-encoded raw bytes.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::Serialization(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse a transaction from raw bytes.
    ///
    /// The slice must contain exactly one transaction; trailing bytes are
    /// rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = Reader::new(bytes);
        let tx = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::Serialization(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    /// Deserialize a transaction from a reader.
    ///
    /// Leaves the reader positioned after the transaction, so callers
    /// parsing container formats (BEEF) can continue from there.
    pub fn read_from(reader: &mut Reader) -> Result<Self, TransactionError> {
        let version = reader.read_u32_le().map_err(|e| {
            TransactionError::Serialization(format!("reading version: {}", e))
        })?;

        let input_count = reader.read_varint().map_err(|e| {
            TransactionError::Serialization(format!("reading input count: {}", e))
        })?;
        let mut inputs = Vec::with_capacity(input_count.value() as usize);
        for _ in 0..input_count.value() {
            inputs.push(TransactionInput::read_from(reader)?);
        }

        let output_count = reader.read_varint().map_err(|e| {
            TransactionError::Serialization(format!("reading output count: {}", e))
        })?;
        let mut outputs = Vec::with_capacity(output_count.value() as usize);
        for _ in 0..output_count.value() {
            outputs.push(TransactionOutput::read_from(reader)?);
        }

        let lock_time = reader.read_u32_le().map_err(|e| {
            TransactionError::Serialization(format!("reading lock time: {}", e))
        })?;

        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time,
            metadata: HashMap::new(),
            merkle_path: None,
            cached_hash: OnceLock::new(),
        })
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Serialize this transaction to raw bytes.
    ///
    /// Fails when an output is still awaiting its amount or an input has
    /// no unlocking script.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        let mut writer = Writer::with_capacity(256);
        writer.write_u32_le(self.version);

        writer.write_varint(VarInt::from(self.inputs.len()));
        for (index, input) in self.inputs.iter().enumerate() {
            input.write_to(&mut writer, index)?;
        }

        self.write_outputs(&mut writer)?;
        writer.write_u32_le(self.lock_time);
        Ok(writer.into_bytes())
    }

    /// Serialize this transaction to a hex string.
    pub fn to_hex(&self) -> Result<String, TransactionError> {
        Ok(hex::encode(self.to_bytes()?))
    }

    /// Write the output count and outputs (shared by the raw and EF
    /// layouts).
    pub(crate) fn write_outputs(&self, writer: &mut Writer) -> Result<(), TransactionError> {
        writer.write_varint(VarInt::from(self.outputs.len()));
        for (index, output) in self.outputs.iter().enumerate() {
            let satoshis = output.satoshis.ok_or({
                if output.change {
                    TransactionError::MissingChangeAmount(index)
                } else {
                    TransactionError::MissingAmount(index)
                }
            })?;
            writer.write_u64_le(satoshis);
            let script = output.locking_script.to_bytes();
            writer.write_varint(VarInt::from(script.len()));
            writer.write_bytes(script);
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------

    /// Double-SHA256 of the raw encoding, in internal (little-endian)
    /// byte order. Memoized until the next mutation.
    pub fn hash(&self) -> Result<[u8; 32], TransactionError> {
        if let Some(cached) = self.cached_hash.get() {
            return Ok(*cached);
        }
        let digest = txforge_primitives::hash::sha256d(&self.to_bytes()?);
        Ok(*self.cached_hash.get_or_init(|| digest))
    }

    /// The transaction ID. Its `Display` form is the conventional
    /// big-endian hex rendering.
    pub fn tx_id(&self) -> Result<Hash, TransactionError> {
        Ok(Hash::new(self.hash()?))
    }

    /// The transaction ID as big-endian hex.
    pub fn tx_id_hex(&self) -> Result<String, TransactionError> {
        Ok(self.tx_id()?.to_string())
    }

    /// Drop the memoized hash. Called by every mutator.
    pub(crate) fn invalidate_cache(&mut self) {
        self.cached_hash = OnceLock::new();
    }

    // -----------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------

    /// Append an input.
    ///
    /// The input must identify its source either by `source_txid` or by a
    /// `source_transaction` back-reference; with only the latter, the
    /// txid is derived from it here.
    pub fn add_input(&mut self, mut input: TransactionInput) -> Result<(), TransactionError> {
        if input.source_txid == Hash::default() {
            match &input.source_transaction {
                Some(source) => input.source_txid = source.tx_id()?,
                None => {
                    return Err(TransactionError::MissingSource(
                        "input carries neither a source txid nor a source transaction"
                            .to_string(),
                    ))
                }
            }
        }
        self.inputs.push(input);
        self.invalidate_cache();
        Ok(())
    }

    /// Append an output.
    pub fn add_output(&mut self, output: TransactionOutput) {
        self.outputs.push(output);
        self.invalidate_cache();
    }

    /// Append a P2PKH output paying `address`.
    ///
    /// With an amount, the output is fixed; without one, it is flagged as
    /// change and filled in by [`fee`](Self::fee).
    pub fn add_p2pkh_output(
        &mut self,
        address: &str,
        satoshis: Option<u64>,
    ) -> Result<(), TransactionError> {
        let address = Address::from_string(address)?;
        self.add_output(TransactionOutput {
            change: satoshis.is_none(),
            satoshis,
            locking_script: p2pkh::lock(&address),
        });
        Ok(())
    }

    /// Merge entries into the metadata map.
    ///
    /// Metadata is never serialized, so this does not disturb the hash
    /// cache.
    pub fn update_metadata(&mut self, entries: HashMap<String, serde_json::Value>) {
        self.metadata.extend(entries);
    }

    // -----------------------------------------------------------------
    // Totals
    // -----------------------------------------------------------------

    /// Sum of the satoshi values this transaction spends.
    ///
    /// Fails with `MissingSource` when any input cannot resolve its
    /// source output.
    pub fn total_input_satoshis(&self) -> Result<u64, TransactionError> {
        let mut total = 0u64;
        for (index, input) in self.inputs.iter().enumerate() {
            let satoshis = input.source_satoshis().ok_or_else(|| {
                TransactionError::MissingSource(format!(
                    "input {} has no resolvable source output",
                    index
                ))
            })?;
            total += satoshis;
        }
        Ok(total)
    }

    /// Sum of the satoshi values this transaction creates.
    pub fn total_output_satoshis(&self) -> Result<u64, TransactionError> {
        let mut total = 0u64;
        for (index, output) in self.outputs.iter().enumerate() {
            total += output.satoshis.ok_or({
                if output.change {
                    TransactionError::MissingChangeAmount(index)
                } else {
                    TransactionError::MissingAmount(index)
                }
            })?;
        }
        Ok(total)
    }

    // -----------------------------------------------------------------
    // Signing
    // -----------------------------------------------------------------

    /// Produce unlocking scripts for every templated input.
    ///
    /// Every output must already carry an amount (run [`fee`](Self::fee)
    /// first when change outputs are present). All templates are
    /// evaluated against the transaction as it stands before any result
    /// is assigned, so a failing template leaves the transaction
    /// untouched.
    pub fn sign(&mut self) -> Result<(), TransactionError> {
        for (index, output) in self.outputs.iter().enumerate() {
            if output.satoshis.is_none() {
                return Err(if output.change {
                    TransactionError::MissingChangeAmount(index)
                } else {
                    TransactionError::MissingAmount(index)
                });
            }
        }

        let mut unlocking_scripts = Vec::new();
        for (index, input) in self.inputs.iter().enumerate() {
            if let Some(template) = &input.unlocking_script_template {
                unlocking_scripts.push((index, template.sign(self, index)?));
            }
        }
        for (index, script) in unlocking_scripts {
            self.inputs[index].unlocking_script = Some(script);
        }

        self.invalidate_cache();
        Ok(())
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}
